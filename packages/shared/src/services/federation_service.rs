use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info};

use crate::config::{ExchangeMode, FederationSettings};
use crate::models::assertion::{user_profile_name, SamlAttributes};
use crate::models::http::ProxyRequest;
use crate::models::metadata::TeamMetadata;
use crate::models::studio::ProfileStatus;
use crate::repositories::studio_repository::StudioRepository;
use crate::services::errors::federation_service_errors::FederationServiceError;
use crate::services::polling::{poll_until, PollError, PollOutcome, PollPolicy};

/// Exchanges a SAML login for a presigned Studio URL.
#[derive(Clone)]
pub struct FederationService {
    repository: Arc<dyn StudioRepository + Send + Sync>,
    settings: Arc<FederationSettings>,
    policy: PollPolicy,
}

impl FederationService {
    pub fn new(
        repository: Arc<dyn StudioRepository + Send + Sync>,
        settings: Arc<FederationSettings>,
        policy: PollPolicy,
    ) -> Self {
        FederationService {
            repository,
            settings,
            policy,
        }
    }

    /// Returns the authorized URL the caller should be redirected to.
    pub async fn exchange(&self, request: &ProxyRequest) -> Result<String, FederationServiceError> {
        if self.settings.mode == ExchangeMode::Disabled {
            return Err(FederationServiceError::NotImplemented);
        }

        let body = request_body(request)?;
        let attributes = SamlAttributes::from_form_body(&body)?;
        debug!("Parsed {} SAML attributes", attributes.len());

        self.exchange_attributes(&attributes).await
    }

    async fn exchange_attributes(
        &self,
        attributes: &SamlAttributes,
    ) -> Result<String, FederationServiceError> {
        let user_id = self.attribute(attributes, &self.settings.user_id_key)?;
        let team_id = self.attribute(attributes, &self.settings.team_id_key)?;
        let profile_name = user_profile_name(user_id, team_id);

        match &self.settings.mode {
            ExchangeMode::DomainId => {
                let domain_id = self.attribute(attributes, &self.settings.domain_id_key)?;
                info!(
                    "Got domain_id={} and constructed user profile name={}",
                    domain_id, profile_name
                );
                self.presigned_url(
                    domain_id,
                    &profile_name,
                    self.settings.session_expiration_seconds,
                )
                .await
            }
            ExchangeMode::TeamMetadata(metadata) => {
                let team = metadata
                    .get(team_id)
                    .ok_or_else(|| FederationServiceError::NoMetadata(team_id.to_string()))?;
                info!(
                    "Got domain_id={} for team {} and constructed user profile name={}",
                    team.domain_id, team_id, profile_name
                );
                self.ensure_user_profile(team, &profile_name).await?;
                self.presigned_url(
                    &team.domain_id,
                    &profile_name,
                    team.session_expiration
                        .unwrap_or(self.settings.session_expiration_seconds),
                )
                .await
            }
            ExchangeMode::Disabled => Err(FederationServiceError::NotImplemented),
        }
    }

    fn attribute<'a>(
        &self,
        attributes: &'a SamlAttributes,
        name: &str,
    ) -> Result<&'a str, FederationServiceError> {
        attributes
            .get(name)
            .ok_or_else(|| FederationServiceError::MissingAttribute(name.to_string()))
    }

    async fn presigned_url(
        &self,
        domain_id: &str,
        profile_name: &str,
        session_expiration_seconds: i32,
    ) -> Result<String, FederationServiceError> {
        let url = self
            .repository
            .create_presigned_domain_url(
                domain_id,
                profile_name,
                session_expiration_seconds,
                self.settings.presigned_url_expiration_seconds,
            )
            .await?;
        info!("Issued presigned URL for user profile {}", profile_name);
        Ok(url)
    }

    /// Creates the user profile on first login and waits until it can be used.
    async fn ensure_user_profile(
        &self,
        team: &TeamMetadata,
        profile_name: &str,
    ) -> Result<(), FederationServiceError> {
        match self
            .repository
            .describe_user_profile(&team.domain_id, profile_name)
            .await
            .map_err(FederationServiceError::Provisioning)?
        {
            Some(ProfileStatus::InService) => return Ok(()),
            Some(status) => info!("User profile {} is {:?}, waiting", profile_name, status),
            None => {
                info!("Creating user profile {}", profile_name);
                self.repository
                    .create_user_profile(&team.new_user_profile(profile_name))
                    .await
                    .map_err(FederationServiceError::Provisioning)?;
            }
        }

        let domain_id = team.domain_id.as_str();
        poll_until(&self.policy, None, |_| self.probe_user_profile(domain_id, profile_name))
            .await
            .map_err(|e| match e {
                PollError::Failed(err) => err,
                PollError::Exhausted { attempts } => FederationServiceError::Timeout {
                    user_profile_name: profile_name.to_string(),
                    attempts,
                },
            })
    }

    async fn probe_user_profile(
        &self,
        domain_id: &str,
        profile_name: &str,
    ) -> Result<PollOutcome<()>, FederationServiceError> {
        match self
            .repository
            .describe_user_profile(domain_id, profile_name)
            .await
            .map_err(FederationServiceError::Provisioning)?
        {
            Some(ProfileStatus::InService) => {
                info!("User profile {} is in service", profile_name);
                Ok(PollOutcome::Ready(()))
            }
            Some(ProfileStatus::Failed) => Err(FederationServiceError::ProvisioningFailed(
                profile_name.to_string(),
            )),
            status => {
                debug!("User profile {} status: {:?}", profile_name, status);
                Ok(PollOutcome::Pending)
            }
        }
    }
}

fn request_body(request: &ProxyRequest) -> Result<String, FederationServiceError> {
    let body = request
        .body
        .as_deref()
        .filter(|body| !body.is_empty())
        .ok_or_else(|| FederationServiceError::MalformedRequest("No body key in the request".to_string()))?;

    if !request.is_base64_encoded {
        return Ok(body.to_string());
    }

    let bytes = STANDARD
        .decode(body)
        .map_err(|e| FederationServiceError::MalformedRequest(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| FederationServiceError::MalformedRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assertion::tests::{form_body, saml_response};
    use crate::models::metadata::{ProfileTag, ProfileUserSettings, TeamMetadataMap};
    use crate::repositories::errors::studio_repository_errors::StudioRepositoryError;
    use crate::repositories::studio_repository::MockStudioRepository;

    const AUTHORIZED_URL: &str = "https://d1.studio.eu-west-1.sagemaker.aws/auth?token=abc";

    fn request(attributes: &[(&str, &str)]) -> ProxyRequest {
        ProxyRequest {
            body: Some(form_body(&saml_response(attributes))),
            is_base64_encoded: false,
        }
    }

    fn metadata_settings(metadata: TeamMetadataMap) -> FederationSettings {
        FederationSettings {
            mode: ExchangeMode::TeamMetadata(metadata),
            ..FederationSettings::default()
        }
    }

    fn team_metadata() -> TeamMetadataMap {
        let mut metadata = TeamMetadataMap::new();
        metadata.insert(
            "t1".to_string(),
            TeamMetadata {
                domain_id: "d1".to_string(),
                tags: vec![ProfileTag {
                    key: "Team".to_string(),
                    value: "t1".to_string(),
                }],
                user_settings: ProfileUserSettings::default(),
                session_expiration: Some(1800),
            },
        );
        metadata
    }

    fn service(repository: MockStudioRepository, settings: FederationSettings) -> FederationService {
        FederationService::new(
            Arc::new(repository),
            Arc::new(settings),
            PollPolicy::immediate(5),
        )
    }

    #[tokio::test]
    async fn test_domain_id_mode_uses_assertion_domain() {
        let mut repository = MockStudioRepository::new();
        repository
            .expect_create_presigned_domain_url()
            .withf(|domain_id, profile, session, expires| {
                domain_id == "d1" && profile == "u1-t1" && *session == 43200 && *expires == 5
            })
            .times(1)
            .returning(|_, _, _, _| Ok(AUTHORIZED_URL.to_string()));

        let url = service(repository, FederationSettings::default())
            .exchange(&request(&[("ssouserid", "u1"), ("teamid", "t1"), ("domainid", "d1")]))
            .await
            .unwrap();

        assert_eq!(url, AUTHORIZED_URL);
    }

    #[tokio::test]
    async fn test_missing_body() {
        let repository = MockStudioRepository::new();

        let err = service(repository, FederationSettings::default())
            .exchange(&ProxyRequest::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "No body key in the request");
    }

    #[tokio::test]
    async fn test_base64_encoded_request_body() {
        let mut repository = MockStudioRepository::new();
        repository
            .expect_create_presigned_domain_url()
            .returning(|_, _, _, _| Ok(AUTHORIZED_URL.to_string()));

        let inner = request(&[("ssouserid", "u1"), ("teamid", "t1"), ("domainid", "d1")]);
        let wrapped = ProxyRequest {
            body: inner.body.map(|body| STANDARD.encode(body)),
            is_base64_encoded: true,
        };

        let url = service(repository, FederationSettings::default())
            .exchange(&wrapped)
            .await
            .unwrap();

        assert_eq!(url, AUTHORIZED_URL);
    }

    #[tokio::test]
    async fn test_missing_attribute() {
        let repository = MockStudioRepository::new();

        let err = service(repository, FederationSettings::default())
            .exchange(&request(&[("ssouserid", "u1"), ("teamid", "t1")]))
            .await
            .unwrap_err();

        assert!(matches!(err, FederationServiceError::MissingAttribute(ref name) if name == "domainid"));
    }

    #[tokio::test]
    async fn test_no_metadata_for_team() {
        let mut repository = MockStudioRepository::new();
        repository.expect_describe_user_profile().never();
        repository.expect_create_presigned_domain_url().never();

        let err = service(repository, metadata_settings(TeamMetadataMap::new()))
            .exchange(&request(&[("ssouserid", "u1"), ("teamid", "t1")]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "no user profile metadata found for team t1");
    }

    #[tokio::test]
    async fn test_existing_profile_is_not_created() {
        let mut repository = MockStudioRepository::new();
        repository
            .expect_describe_user_profile()
            .withf(|domain_id, profile| domain_id == "d1" && profile == "u1-t1")
            .times(1)
            .returning(|_, _| Ok(Some(ProfileStatus::InService)));
        repository.expect_create_user_profile().never();
        repository
            .expect_create_presigned_domain_url()
            .withf(|domain_id, profile, session, _| {
                domain_id == "d1" && profile == "u1-t1" && *session == 1800
            })
            .times(1)
            .returning(|_, _, _, _| Ok(AUTHORIZED_URL.to_string()));

        let url = service(repository, metadata_settings(team_metadata()))
            .exchange(&request(&[("ssouserid", "u1"), ("teamid", "t1")]))
            .await
            .unwrap();

        assert_eq!(url, AUTHORIZED_URL);
    }

    #[tokio::test]
    async fn test_missing_profile_is_created_and_awaited() {
        let mut repository = MockStudioRepository::new();
        let mut describes = 0;
        repository
            .expect_describe_user_profile()
            .times(4)
            .returning(move |_, _| {
                describes += 1;
                Ok(match describes {
                    1 => None,
                    2 => Some(ProfileStatus::Pending),
                    3 => Some(ProfileStatus::Pending),
                    _ => Some(ProfileStatus::InService),
                })
            });
        repository
            .expect_create_user_profile()
            .withf(|profile| {
                profile.domain_id == "d1"
                    && profile.user_profile_name == "u1-t1"
                    && profile.tags == vec![("Team".to_string(), "t1".to_string())]
            })
            .times(1)
            .returning(|_| Ok(()));
        repository
            .expect_create_presigned_domain_url()
            .times(1)
            .returning(|_, _, _, _| Ok(AUTHORIZED_URL.to_string()));

        let url = service(repository, metadata_settings(team_metadata()))
            .exchange(&request(&[("ssouserid", "u1"), ("teamid", "t1")]))
            .await
            .unwrap();

        assert_eq!(url, AUTHORIZED_URL);
    }

    #[tokio::test]
    async fn test_failed_profile_stops_waiting() {
        let mut repository = MockStudioRepository::new();
        repository
            .expect_describe_user_profile()
            .returning(|_, _| Ok(Some(ProfileStatus::Failed)));
        repository.expect_create_presigned_domain_url().never();

        let err = service(repository, metadata_settings(team_metadata()))
            .exchange(&request(&[("ssouserid", "u1"), ("teamid", "t1")]))
            .await
            .unwrap_err();

        assert!(matches!(err, FederationServiceError::ProvisioningFailed(_)));
    }

    #[tokio::test]
    async fn test_profile_wait_times_out() {
        let mut repository = MockStudioRepository::new();
        repository
            .expect_describe_user_profile()
            .returning(|_, _| Ok(Some(ProfileStatus::Pending)));

        let err = service(repository, metadata_settings(team_metadata()))
            .exchange(&request(&[("ssouserid", "u1"), ("teamid", "t1")]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FederationServiceError::Timeout { attempts: 5, .. }
        ));
    }

    #[tokio::test]
    async fn test_control_plane_error_keeps_status() {
        let mut repository = MockStudioRepository::new();
        repository
            .expect_create_presigned_domain_url()
            .returning(|_, _, _, _| {
                Err(StudioRepositoryError::ControlPlane {
                    status: 403,
                    code: Some("AccessDeniedException".to_string()),
                    message: "User is not authorized".to_string(),
                })
            });

        let err = service(repository, FederationSettings::default())
            .exchange(&request(&[("ssouserid", "u1"), ("teamid", "t1"), ("domainid", "d1")]))
            .await
            .unwrap_err();

        match err {
            FederationServiceError::ControlPlane { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "User is not authorized");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_provisioning_control_plane_error_is_not_passed_through() {
        let mut repository = MockStudioRepository::new();
        repository
            .expect_describe_user_profile()
            .returning(|_, _| Ok(None));
        repository.expect_create_user_profile().times(1).returning(|_| {
            Err(StudioRepositoryError::ControlPlane {
                status: 403,
                code: Some("AccessDeniedException".to_string()),
                message: "Not allowed to create user profiles".to_string(),
            })
        });
        repository.expect_create_presigned_domain_url().never();

        let err = service(repository, metadata_settings(team_metadata()))
            .exchange(&request(&[("ssouserid", "u1"), ("teamid", "t1")]))
            .await
            .unwrap_err();

        assert!(matches!(err, FederationServiceError::Provisioning(_)));
        assert!(err.to_string().contains("Not allowed to create user profiles"));
    }

    #[tokio::test]
    async fn test_disabled_mode() {
        let repository = MockStudioRepository::new();
        let settings = FederationSettings {
            mode: ExchangeMode::Disabled,
            ..FederationSettings::default()
        };

        let err = service(repository, settings)
            .exchange(&request(&[("ssouserid", "u1"), ("teamid", "t1")]))
            .await
            .unwrap_err();

        assert!(matches!(err, FederationServiceError::NotImplemented));
    }
}

use async_trait::async_trait;
use aws_sdk_sagemaker::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sagemaker::types::{AppType, Tag, UserSettings};
use aws_sdk_sagemaker::Client;
use tracing::debug;

use crate::models::studio::{
    AppOwner, AppStatus, AppSummary, NewUserProfile, ProfileStatus, UserProfileSummary,
};
use crate::repositories::errors::studio_repository_errors::StudioRepositoryError;

#[cfg(test)]
use mockall::automock;

/// SageMaker control-plane calls needed to tear down a domain and to log
/// users into it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StudioRepository: Send + Sync {
    async fn domain_exists(&self, domain_id: &str) -> Result<bool, StudioRepositoryError>;

    /// Every app of the domain, across all result pages.
    async fn list_apps(&self, domain_id: &str) -> Result<Vec<AppSummary>, StudioRepositoryError>;

    async fn delete_app(&self, app: &AppSummary) -> Result<(), StudioRepositoryError>;

    /// Every user profile of the domain, across all result pages.
    async fn list_user_profiles(
        &self,
        domain_id: &str,
    ) -> Result<Vec<UserProfileSummary>, StudioRepositoryError>;

    async fn delete_user_profile(
        &self,
        domain_id: &str,
        user_profile_name: &str,
    ) -> Result<(), StudioRepositoryError>;

    /// `None` when the profile does not exist.
    async fn describe_user_profile(
        &self,
        domain_id: &str,
        user_profile_name: &str,
    ) -> Result<Option<ProfileStatus>, StudioRepositoryError>;

    async fn create_user_profile(
        &self,
        profile: &NewUserProfile,
    ) -> Result<(), StudioRepositoryError>;

    async fn create_presigned_domain_url(
        &self,
        domain_id: &str,
        user_profile_name: &str,
        session_expiration_seconds: i32,
        expires_in_seconds: i32,
    ) -> Result<String, StudioRepositoryError>;
}

pub struct SageMakerStudioRepository {
    pub client: Client,
}

impl SageMakerStudioRepository {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn control_plane_error<E>(err: SdkError<E>) -> StudioRepositoryError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match &err {
        SdkError::ServiceError(_) => {
            let status = err
                .raw_response()
                .map(|raw| raw.status().as_u16())
                .unwrap_or(500);
            StudioRepositoryError::ControlPlane {
                status,
                code: err.code().map(str::to_string),
                message: err
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| DisplayErrorContext(&err).to_string()),
            }
        }
        _ => StudioRepositoryError::Transport(DisplayErrorContext(&err).to_string()),
    }
}

#[async_trait]
impl StudioRepository for SageMakerStudioRepository {
    async fn domain_exists(&self, domain_id: &str) -> Result<bool, StudioRepositoryError> {
        match self.client.describe_domain().domain_id(domain_id).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                if e
                    .as_service_error()
                    .map_or(false, |service_err| service_err.is_resource_not_found())
                {
                    Ok(false)
                } else {
                    Err(control_plane_error(e))
                }
            }
        }
    }

    async fn list_apps(&self, domain_id: &str) -> Result<Vec<AppSummary>, StudioRepositoryError> {
        let mut apps = Vec::new();
        let mut paginator = self
            .client
            .list_apps()
            .domain_id_equals(domain_id)
            .into_paginator()
            .send();

        while let Some(page) = paginator.next().await {
            let page = page.map_err(control_plane_error)?;
            for details in page.apps() {
                let owner = match (details.space_name(), details.user_profile_name()) {
                    (Some(space), _) => AppOwner::Space(space.to_string()),
                    (None, Some(profile)) => AppOwner::UserProfile(profile.to_string()),
                    (None, None) => {
                        debug!("Skipping app without owner: {:?}", details.app_name());
                        continue;
                    }
                };
                apps.push(AppSummary {
                    domain_id: details.domain_id().unwrap_or(domain_id).to_string(),
                    owner,
                    app_type: details
                        .app_type()
                        .map(|t| t.as_str().to_string())
                        .unwrap_or_default(),
                    app_name: details.app_name().unwrap_or_default().to_string(),
                    status: AppStatus::parse(
                        details.status().map(|s| s.as_str()).unwrap_or_default(),
                    ),
                });
            }
        }

        Ok(apps)
    }

    async fn delete_app(&self, app: &AppSummary) -> Result<(), StudioRepositoryError> {
        let mut request = self
            .client
            .delete_app()
            .domain_id(&app.domain_id)
            .app_type(AppType::from(app.app_type.as_str()))
            .app_name(&app.app_name);
        request = match &app.owner {
            AppOwner::UserProfile(profile) => request.user_profile_name(profile),
            AppOwner::Space(space) => request.space_name(space),
        };

        match request.send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                if e
                    .as_service_error()
                    .map_or(false, |service_err| service_err.is_resource_not_found())
                {
                    Ok(())
                } else {
                    Err(control_plane_error(e))
                }
            }
        }
    }

    async fn list_user_profiles(
        &self,
        domain_id: &str,
    ) -> Result<Vec<UserProfileSummary>, StudioRepositoryError> {
        let mut profiles = Vec::new();
        let mut paginator = self
            .client
            .list_user_profiles()
            .domain_id_equals(domain_id)
            .into_paginator()
            .send();

        while let Some(page) = paginator.next().await {
            let page = page.map_err(control_plane_error)?;
            for details in page.user_profiles() {
                profiles.push(UserProfileSummary {
                    domain_id: details.domain_id().unwrap_or(domain_id).to_string(),
                    user_profile_name: details.user_profile_name().unwrap_or_default().to_string(),
                    status: ProfileStatus::parse(
                        details.status().map(|s| s.as_str()).unwrap_or_default(),
                    ),
                });
            }
        }

        Ok(profiles)
    }

    async fn delete_user_profile(
        &self,
        domain_id: &str,
        user_profile_name: &str,
    ) -> Result<(), StudioRepositoryError> {
        let result = self
            .client
            .delete_user_profile()
            .domain_id(domain_id)
            .user_profile_name(user_profile_name)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if e
                    .as_service_error()
                    .map_or(false, |service_err| service_err.is_resource_not_found())
                {
                    Ok(())
                } else {
                    Err(control_plane_error(e))
                }
            }
        }
    }

    async fn describe_user_profile(
        &self,
        domain_id: &str,
        user_profile_name: &str,
    ) -> Result<Option<ProfileStatus>, StudioRepositoryError> {
        let result = self
            .client
            .describe_user_profile()
            .domain_id(domain_id)
            .user_profile_name(user_profile_name)
            .send()
            .await;

        match result {
            Ok(output) => Ok(Some(ProfileStatus::parse(
                output.status().map(|s| s.as_str()).unwrap_or_default(),
            ))),
            Err(e) => {
                if e
                    .as_service_error()
                    .map_or(false, |service_err| service_err.is_resource_not_found())
                {
                    Ok(None)
                } else {
                    Err(control_plane_error(e))
                }
            }
        }
    }

    async fn create_user_profile(
        &self,
        profile: &NewUserProfile,
    ) -> Result<(), StudioRepositoryError> {
        let tags = profile
            .tags
            .iter()
            .map(|(key, value)| {
                Ok::<_, StudioRepositoryError>(Tag::builder().key(key).value(value).build())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut settings = UserSettings::builder().set_execution_role(profile.execution_role.clone());
        if !profile.security_groups.is_empty() {
            settings = settings.set_security_groups(Some(profile.security_groups.clone()));
        }

        let mut request = self
            .client
            .create_user_profile()
            .domain_id(&profile.domain_id)
            .user_profile_name(&profile.user_profile_name)
            .user_settings(settings.build());
        if !tags.is_empty() {
            request = request.set_tags(Some(tags));
        }

        request.send().await.map_err(control_plane_error)?;
        Ok(())
    }

    async fn create_presigned_domain_url(
        &self,
        domain_id: &str,
        user_profile_name: &str,
        session_expiration_seconds: i32,
        expires_in_seconds: i32,
    ) -> Result<String, StudioRepositoryError> {
        let output = self
            .client
            .create_presigned_domain_url()
            .domain_id(domain_id)
            .user_profile_name(user_profile_name)
            .session_expiration_duration_in_seconds(session_expiration_seconds)
            .expires_in_seconds(expires_in_seconds)
            .send()
            .await
            .map_err(control_plane_error)?;

        output
            .authorized_url()
            .map(str::to_string)
            .ok_or_else(|| {
                StudioRepositoryError::Validation(
                    "CreatePresignedDomainUrl returned no AuthorizedUrl".to_string(),
                )
            })
    }
}

use crate::models::assertion::AssertionError;
use crate::repositories::errors::studio_repository_errors::StudioRepositoryError;

#[derive(Debug)]
pub enum FederationServiceError {
    MalformedRequest(String),
    MalformedAssertion(AssertionError),
    MissingAttribute(String),
    NoMetadata(String),
    ControlPlane { status: u16, message: String },
    ProvisioningFailed(String),
    Provisioning(StudioRepositoryError),
    Timeout { user_profile_name: String, attempts: u32 },
    NotImplemented,
    RepositoryError(StudioRepositoryError),
}

impl std::fmt::Display for FederationServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FederationServiceError::MalformedRequest(msg) => write!(f, "{}", msg),
            FederationServiceError::MalformedAssertion(err) => write!(f, "{}", err),
            FederationServiceError::MissingAttribute(name) => {
                write!(f, "SAML assertion has no attribute {}", name)
            }
            FederationServiceError::NoMetadata(team_id) => {
                write!(f, "no user profile metadata found for team {}", team_id)
            }
            FederationServiceError::ControlPlane { message, .. } => write!(f, "{}", message),
            FederationServiceError::ProvisioningFailed(name) => {
                write!(f, "user profile {} failed to provision", name)
            }
            FederationServiceError::Provisioning(err) => {
                write!(f, "failed to provision user profile: {}", err)
            }
            FederationServiceError::Timeout {
                user_profile_name,
                attempts,
            } => write!(
                f,
                "user profile {} not in service after {} attempts",
                user_profile_name, attempts
            ),
            FederationServiceError::NotImplemented => {
                write!(f, "federation exchange is not implemented")
            }
            FederationServiceError::RepositoryError(err) => write!(f, "Repository error: {}", err),
        }
    }
}

impl std::error::Error for FederationServiceError {}

impl From<AssertionError> for FederationServiceError {
    fn from(err: AssertionError) -> Self {
        FederationServiceError::MalformedAssertion(err)
    }
}

impl From<StudioRepositoryError> for FederationServiceError {
    fn from(err: StudioRepositoryError) -> Self {
        match err {
            StudioRepositoryError::ControlPlane {
                status, message, ..
            } => FederationServiceError::ControlPlane { status, message },
            other => FederationServiceError::RepositoryError(other),
        }
    }
}

use crate::repositories::errors::studio_repository_errors::StudioRepositoryError;

#[derive(Debug)]
pub enum TeardownServiceError {
    RepositoryError(StudioRepositoryError),
    Timeout {
        resource: &'static str,
        remaining: usize,
        attempts: u32,
    },
}

impl std::fmt::Display for TeardownServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeardownServiceError::RepositoryError(err) => write!(f, "Repository error: {}", err),
            TeardownServiceError::Timeout {
                resource,
                remaining,
                attempts,
            } => write!(
                f,
                "Timed out after {} attempts with {} {} still active",
                attempts, remaining, resource
            ),
        }
    }
}

impl std::error::Error for TeardownServiceError {}

impl From<StudioRepositoryError> for TeardownServiceError {
    fn from(err: StudioRepositoryError) -> Self {
        TeardownServiceError::RepositoryError(err)
    }
}

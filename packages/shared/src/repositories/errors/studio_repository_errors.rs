#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudioRepositoryError {
    ControlPlane {
        status: u16,
        code: Option<String>,
        message: String,
    },
    Transport(String),
    Validation(String),
}

impl std::fmt::Display for StudioRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StudioRepositoryError::ControlPlane {
                status,
                code,
                message,
            } => match code {
                Some(code) => write!(f, "SageMaker error {} ({}): {}", code, status, message),
                None => write!(f, "SageMaker error ({}): {}", status, message),
            },
            StudioRepositoryError::Transport(msg) => write!(f, "SageMaker request failed: {}", msg),
            StudioRepositoryError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for StudioRepositoryError {}

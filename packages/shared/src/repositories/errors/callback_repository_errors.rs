#[derive(Debug)]
pub enum CallbackRepositoryError {
    Serialization(String),
    Http(String),
    Rejected { status: u16, body: String },
}

impl std::fmt::Display for CallbackRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackRepositoryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            CallbackRepositoryError::Http(msg) => write!(f, "HTTP error: {}", msg),
            CallbackRepositoryError::Rejected { status, body } => {
                write!(f, "Callback rejected with status {}: {}", status, body)
            }
        }
    }
}

impl std::error::Error for CallbackRepositoryError {}

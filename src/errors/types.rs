use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigfootError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Permission error: {0}")]
    Permission(String),

    #[error("Rate limited: {0}")]
    RateLimit(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Scan cancelled: {0}")]
    Cancelled(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DigfootError {
    /// Map a transport-level reqwest failure onto the crate's error kinds.
    pub fn from_transport(context: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DigfootError::Timeout(format!("{}: {}", context, err))
        } else if err.is_decode() {
            DigfootError::UnexpectedResponse(format!("{}: {}", context, err))
        } else {
            DigfootError::Network(format!("{}: {}", context, err))
        }
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CiScopeError {
    #[error("GitHub API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid repository '{0}': expected 'owner/repo'")]
    InvalidRepository(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Log archive error: {0}")]
    Archive(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CiScopeError {
    /// Transport-level failures are retried; HTTP error statuses are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, CiScopeError::Network(_))
    }
}

pub type Result<T> = std::result::Result<T, CiScopeError>;

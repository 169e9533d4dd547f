#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Please wait {0} before posting again")]
    RateLimited(String),

    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    InvalidState(&'static str),
}

impl AppError {
    /// Message suitable for showing to the user.
    ///
    /// Transport-level failures carry no server-provided text, so they
    /// collapse to a generic fallback. Everything else is shown verbatim.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Network(e) => {
                tracing::error!("Network error: {}", e);
                "Failed to submit post".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

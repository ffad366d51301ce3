use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalyxError {
    #[error("Invalid company data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Calculation error: {0}")]
    Calculation(String),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("Batch job not found: {0}")]
    JobNotFound(uuid::Uuid),

    #[error("Evaluation cancelled")]
    Cancelled,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CalyxError>;

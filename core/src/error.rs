use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API returned {status}: {body}")]
    LlmApi { status: u16, body: String },

    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),

    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Threshold amount must be positive, got {amount}")]
    InvalidThreshold { amount: f64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("No clients were created ({requested} requested)")]
    NoClientsCreated { requested: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SeedError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type SeedResult<T> = Result<T, SeedError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("ACCESS_DENIED: {0}")]
    Access(String),
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("MALFORMED_DOCUMENT: {0}")]
    Malformed(String),
    #[error("WRITE_FAILURE: {0}")]
    Write(String),
    #[error("VALIDATION_FAILED: {0}")]
    Validation(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

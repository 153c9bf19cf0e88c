use thiserror::Error;

use crate::history::HistoryError;
use crate::storage::StoreError;

/// TruthTriage client errors
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Request Error: {0}")]
    RequestError(String),

    #[error("Parsing Error: {0}")]
    ParsingError(String),

    #[error("HTTP Error: {status_code} - {message}")]
    HttpError { status_code: u16, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl TriageError {
    /// True for failures that happened on the way to or from the backend,
    /// as opposed to local storage or input problems.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            TriageError::RequestError(_)
                | TriageError::HttpError { .. }
                | TriageError::ParsingError(_)
                | TriageError::ReqwestError(_)
        )
    }
}

/// Result type for TruthTriage operations
pub type TriageResult<T> = Result<T, TriageError>;

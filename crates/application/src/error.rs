//! Application error types

use snare_domain::DomainError;
use thiserror::Error;

use crate::ports::{ApiError, StorageError};

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// A backend API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input could not be parsed.
    #[error("Invalid JSON format")]
    InvalidJson(#[from] serde_json::Error),

    /// Input parsed but failed structural validation.
    #[error("invalid data: {0}")]
    Invalid(String),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

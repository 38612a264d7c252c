//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The protocol is neither `http` nor `https`.
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// A raw HTTP message block could not be parsed.
    #[error("malformed HTTP message: {0}")]
    MalformedMessage(String),

    /// An identifier is invalid or empty.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

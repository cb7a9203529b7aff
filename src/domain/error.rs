//! Domain-level errors (no I/O concerns)

use std::path::PathBuf;
use thiserror::Error;

/// Domain errors represent trees that cannot be transformed as requested.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("malformed <{tag}>: {message}")]
    MalformedInput { tag: String, message: String },

    #[error("cycle detected in reference graph: {0}")]
    CycleDetected(PathBuf),

    #[error("invalid stylesheet: {message}")]
    InvalidStylesheet { message: String },

    #[error("illegal move: {reason}")]
    IllegalMove { reason: &'static str },
}

impl DomainError {
    pub fn malformed(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            tag: tag.into(),
            message: message.into(),
        }
    }
}

/// Result type for tree operations.
pub type DomainResult<T> = Result<T, DomainError>;

//! Error conversion helpers for common I/O operations
//!
//! Provides extension traits for cleaner error handling with path context.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// fs.canonicalize(&src)
    ///     .with_path_context("canonicalize", &src)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;

    /// Map a failed read of `path` to [`ApplicationError::ReadFailure`].
    fn or_read_failure(self, path: &Path) -> ApplicationResult<T>;

    /// Map a failed write of `path` to [`ApplicationError::WriteFailure`].
    fn or_write_failure(self, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }

    fn or_read_failure(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::ReadFailure {
            path: path.to_path_buf(),
            source,
        })
    }

    fn or_write_failure(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::WriteFailure {
            path: path.to_path_buf(),
            source,
        })
    }
}

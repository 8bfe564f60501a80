//! Durable store error types.
//!
//! Typed errors for store operations, with the underlying backend cause
//! attached as a source.

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur when talking to the durable store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A backend call failed.
    #[error("store backend failed during {operation}: {source}")]
    Backend {
        /// The store operation that failed.
        operation: &'static str,
        /// The underlying error.
        #[source]
        source: anyhow::Error,
    },

    /// The backend is not reachable at all.
    #[error("store backend is unavailable")]
    Unavailable,
}

impl StoreError {
    /// A backend failure for the named operation.
    pub fn backend(operation: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Backend {
            operation,
            source: source.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_names_operation() {
        let err = StoreError::backend("mark_online", anyhow::anyhow!("connection reset"));
        let msg = err.to_string();
        assert!(msg.contains("mark_online"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn test_unavailable_error() {
        let msg = StoreError::Unavailable.to_string();
        assert!(msg.contains("unavailable"));
    }

    #[test]
    fn test_backend_error_keeps_source() {
        let err = StoreError::backend("online_resources", anyhow::anyhow!("timed out"));
        let source = std::error::Error::source(&err);
        assert!(source.is_some());
    }
}

use thiserror::Error;

/// Failure reported by any storage collaborator.
///
/// `NotFound` is the only variant callers are expected to branch on; every
/// other variant is an internal failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("store operation `{operation}` was cancelled")]
    Cancelled { operation: &'static str },

    #[error("store operation `{operation}` exceeded the invocation deadline")]
    DeadlineExceeded { operation: &'static str },

    #[error("store operation `{operation}` failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

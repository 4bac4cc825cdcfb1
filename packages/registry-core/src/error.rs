//! Error types shared by registry chain links and transports.

/// Why an [`ExecutionContext`](crate::ExecutionContext) is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("context cancelled")]
    Cancelled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Errors returned by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("not found: {name}")]
    NotFound { name: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("call cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("find stream closed by receiver")]
    StreamClosed,
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ContextError> for RegistryError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Cancelled => RegistryError::Cancelled,
            ContextError::DeadlineExceeded => RegistryError::DeadlineExceeded,
        }
    }
}

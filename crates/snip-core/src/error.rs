use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The original URL is already shortened. Recoverable: callers look
    /// up the existing short code instead of failing the request.
    #[error("original url already shortened: {0}")]
    Duplicate(String),
    /// The short code is already bound to a different original URL.
    #[error("short code already taken: {0}")]
    CodeTaken(String),
    /// The active backend does not implement this capability. Surfaced
    /// to callers as "not applicable", never as a transient failure.
    #[error("not supported by this backend: {0}")]
    Unsupported(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

impl StorageError {
    /// Whether the error marks a capability the backend lacks rather
    /// than a failed operation.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, StorageError::Unsupported(_))
    }
}

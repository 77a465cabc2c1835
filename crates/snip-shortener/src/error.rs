use snip_core::StorageError;
use thiserror::Error;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// The URL is not shortenable; rejected before touching storage.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// A batch request carried no items.
    #[error("batch contains no items")]
    EmptyBatch,
    /// Durable persistence was requested but the journal write failed;
    /// the shorten call must not be reported as successful.
    #[error("journal write failed: {0}")]
    Journal(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

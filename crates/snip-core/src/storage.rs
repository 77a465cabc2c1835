use crate::error::Result;
use crate::model::{BatchItem, OwnedUrl, Resolved, StatSnapshot};
use async_trait::async_trait;

/// Contract implemented by every storage backend.
///
/// A backend is selected once at process start and injected into the
/// service as an immutable dependency; it is never swapped at runtime.
/// Backends that lack a capability (the volatile backend has no owner
/// column, no deleted flag and no connection to probe) return
/// [`StorageError::Unsupported`](crate::StorageError::Unsupported) from
/// the affected methods.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Inserts a single mapping.
    ///
    /// Returns `Err(Duplicate)` if `original` is already shortened and
    /// `Err(CodeTaken)` if `short` is already bound to another URL, so
    /// callers can recover the existing code instead of failing.
    async fn insert_one(&self, original: &str, short: &str, owner: &str) -> Result<()>;

    /// Inserts a batch of mappings, all-or-nothing. Backends with
    /// transactions wrap the whole batch in one; any single failure
    /// aborts the batch with nothing committed.
    async fn insert_batch(&self, items: &[BatchItem]) -> Result<()>;

    /// Looks up the original URL and deletion state for a short code.
    /// Returns `None` if the code does not exist.
    async fn lookup_by_short(&self, short: &str) -> Result<Option<Resolved>>;

    /// Looks up the short code bound to an original URL.
    /// Returns `None` if the URL was never shortened.
    async fn lookup_by_original(&self, original: &str) -> Result<Option<String>>;

    /// Lists every mapping created by the given owner.
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<OwnedUrl>>;

    /// Soft-deletes every listed short code in one transaction.
    /// Unknown codes are silently ignored; the call is idempotent.
    async fn mark_deleted(&self, shorts: &[String]) -> Result<()>;

    /// Recomputes service-wide counters.
    async fn stats(&self) -> Result<StatSnapshot>;

    /// Health probe against the underlying store.
    async fn check_connectivity(&self) -> Result<()>;

    /// Creates the schema if it does not exist yet. A no-op for
    /// backends that need none.
    async fn ensure_schema(&self) -> Result<()>;

    /// Wipes all mappings. Test and operations utility.
    async fn clear(&self) -> Result<()>;
}

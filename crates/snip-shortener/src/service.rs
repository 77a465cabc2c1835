use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{debug, info, warn};

use snip_core::error::StorageError;
use snip_core::model::{BatchItem, OwnedUrl, StatSnapshot};
use snip_core::storage::Storage;

use crate::deletion::DeletionQueue;
use crate::error::{Result, ServiceError};
use crate::journal::{Journal, JournalRecord};

/// Timeout applied to each replayed record during bootstrap, so a
/// stalled backend cannot hang startup indefinitely.
const RESTORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a shorten request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortened {
    /// The short code now bound to the original URL.
    pub short_code: String,
    /// True when the URL was already shortened and `short_code` is the
    /// pre-existing binding. A conflict, not a failure: adapters
    /// translate this into an "already shortened" response.
    pub existed: bool,
}

/// Outcome of resolving a short code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The code is live; redirect to the original URL.
    Found(String),
    /// The code existed but was soft-deleted. The resource is gone
    /// (HTTP 410 semantics); no original URL is exposed.
    Gone,
    /// The code was never shortened.
    NotFound,
}

/// Orchestrates the active storage backend.
///
/// Owns the backend (selected once at startup, never swapped), the
/// optional durability journal, and the background deletion pipeline.
/// All methods are safe to call concurrently from many request
/// handlers.
#[derive(Debug)]
pub struct ShortenerService<S> {
    storage: Arc<S>,
    journal: Option<Journal>,
    deletions: DeletionQueue,
}

impl<S: Storage> ShortenerService<S> {
    /// Creates the service and spawns its deletion worker. Must be
    /// called from within a Tokio runtime. When `journal_path` is set,
    /// every successful shorten is also appended there.
    pub fn new(storage: S, journal_path: Option<PathBuf>) -> Self {
        let storage = Arc::new(storage);
        let deletions = DeletionQueue::start(Arc::clone(&storage));
        Self {
            storage,
            journal: journal_path.map(Journal::new),
            deletions,
        }
    }

    /// Only `http://` and `https://` URLs are shortenable.
    fn validate_url(url: &str) -> Result<()> {
        if url.starts_with("http://") || url.starts_with("https://") {
            Ok(())
        } else {
            Err(ServiceError::InvalidUrl(url.to_string()))
        }
    }

    /// Binds `short` to `original` for `owner`.
    ///
    /// If the URL is already shortened the existing code is returned
    /// with `existed = true` instead of an error. A journal write
    /// failure fails the call: the caller must not believe the shorten
    /// succeeded if durable persistence was requested but did not
    /// happen.
    pub async fn shorten(&self, original: &str, short: &str, owner: &str) -> Result<Shortened> {
        Self::validate_url(original)?;

        match self.storage.insert_one(original, short, owner).await {
            Ok(()) => {
                self.journal_append(short, original).await?;
                debug!(short, "shortened url");
                Ok(Shortened {
                    short_code: short.to_string(),
                    existed: false,
                })
            }
            Err(StorageError::Duplicate(_)) => {
                let existing = self.storage.lookup_by_original(original).await?;
                match existing {
                    Some(short_code) => Ok(Shortened {
                        short_code,
                        existed: true,
                    }),
                    // The backend reported a duplicate but no mapping
                    // is visible; nothing sane to return.
                    None => Err(StorageError::InvalidData(format!(
                        "duplicate reported but no mapping found for {original}"
                    ))
                    .into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Inserts a batch of mappings, all-or-nothing.
    ///
    /// Any single non-shortenable URL aborts the whole batch before
    /// storage is touched; an empty batch is rejected outright. Returns
    /// the short codes in input order.
    pub async fn shorten_batch(&self, items: &[BatchItem]) -> Result<Vec<String>> {
        if items.is_empty() {
            return Err(ServiceError::EmptyBatch);
        }
        for item in items {
            Self::validate_url(&item.original_url)?;
        }

        self.storage.insert_batch(items).await?;
        for item in items {
            self.journal_append(&item.short_code, &item.original_url)
                .await?;
        }

        Ok(items.iter().map(|item| item.short_code.clone()).collect())
    }

    /// Resolves a short code to its original URL, distinguishing
    /// soft-deleted codes from codes that never existed.
    pub async fn resolve(&self, short: &str) -> Result<Resolution> {
        match self.storage.lookup_by_short(short).await? {
            Some(resolved) if resolved.deleted => Ok(Resolution::Gone),
            Some(resolved) => Ok(Resolution::Found(resolved.original_url)),
            None => Ok(Resolution::NotFound),
        }
    }

    /// Queues short codes for soft deletion and returns without
    /// waiting for them to land.
    ///
    /// Best-effort, at-most-once: a failed flush is logged and the
    /// batch is dropped, so a queued delete is not guaranteed to stick.
    /// Ownership of the codes is not verified here; any caller can
    /// queue any code. Closing that authorization gap is left to
    /// adapters.
    pub async fn enqueue_delete(&self, shorts: Vec<String>) {
        for short in shorts {
            self.deletions.push(short).await;
        }
    }

    /// Lists every mapping created by the given owner.
    pub async fn list_by_owner(&self, owner: &str) -> Result<Vec<OwnedUrl>> {
        Ok(self.storage.list_by_owner(owner).await?)
    }

    /// Recomputes service-wide counters.
    pub async fn stats(&self) -> Result<StatSnapshot> {
        Ok(self.storage.stats().await?)
    }

    /// Probes the active backend.
    pub async fn check_health(&self) -> Result<()> {
        Ok(self.storage.check_connectivity().await?)
    }

    /// One-time startup routine; runs before the service takes
    /// traffic.
    ///
    /// When the backend is reachable its schema is ensured (a schema
    /// failure is fatal, an unreachable or schemaless backend merely
    /// skips the step). When a journal is configured its records are
    /// replayed as direct inserts with an empty owner; no replay error
    /// aborts the remaining replay, so a partially restored previous
    /// run is harmless.
    pub async fn bootstrap(&self) -> Result<()> {
        match self.storage.check_connectivity().await {
            Ok(()) => self.storage.ensure_schema().await?,
            Err(err) => debug!(error = %err, "backend not probeable, skipping schema step"),
        }

        let Some(journal) = &self.journal else {
            return Ok(());
        };
        let records = journal
            .read_all()
            .await
            .map_err(|err| ServiceError::Journal(err.to_string()))?;

        let mut restored = 0usize;
        for JournalRecord {
            short_url,
            original_url,
        } in records
        {
            let insert = self.storage.insert_one(&original_url, &short_url, "");
            match time::timeout(RESTORE_TIMEOUT, insert).await {
                Ok(Ok(())) => restored += 1,
                // Already present, e.g. replayed by a previous run.
                Ok(Err(StorageError::Duplicate(_) | StorageError::CodeTaken(_))) => {}
                Ok(Err(err)) => {
                    warn!(short = short_url, error = %err, "journal replay insert failed");
                }
                Err(_) => {
                    warn!(short = short_url, "journal replay insert timed out");
                }
            }
        }
        info!(restored, path = %journal.path().display(), "journal replay complete");
        Ok(())
    }

    async fn journal_append(&self, short: &str, original: &str) -> Result<()> {
        let Some(journal) = &self.journal else {
            return Ok(());
        };
        journal
            .append(&JournalRecord {
                short_url: short.to_string(),
                original_url: original.to_string(),
            })
            .await
            .map_err(|err| ServiceError::Journal(err.to_string()))
    }
}

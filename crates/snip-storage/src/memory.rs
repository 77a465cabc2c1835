use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use snip_core::error::{Result, StorageError};
use snip_core::model::{BatchItem, OwnedUrl, Resolved, StatSnapshot};
use snip_core::storage::Storage;

/// Volatile map-based backend: short code -> original URL.
///
/// There is no secondary index on the original URL, so duplicate
/// detection is a linear scan over all values before every insert.
/// That is O(n) per insert and acceptable only at small scale; it keeps
/// the backend a plain map with no bookkeeping to drift out of sync.
///
/// The map has no owner column and no deleted flag, so owner listings,
/// stats, soft deletion and connectivity probes all report
/// [`StorageError::Unsupported`]. Lookups always report
/// `deleted = false`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    // A single lock, not a sharded map: the dedup scan and the insert
    // must happen under one write guard to keep the one-code-per-URL
    // invariant under concurrent shorten calls.
    urls: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn unsupported(what: &str) -> StorageError {
        StorageError::Unsupported(format!("{what} requires the relational backend"))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn insert_one(&self, original: &str, short: &str, _owner: &str) -> Result<()> {
        let mut urls = self.urls.write().await;
        if urls.values().any(|stored| stored == original) {
            return Err(StorageError::Duplicate(original.to_string()));
        }
        if urls.contains_key(short) {
            return Err(StorageError::CodeTaken(short.to_string()));
        }
        urls.insert(short.to_string(), original.to_string());
        Ok(())
    }

    async fn insert_batch(&self, items: &[BatchItem]) -> Result<()> {
        let mut urls = self.urls.write().await;

        // All-or-nothing without transactions: validate the whole batch
        // against the map and against itself before touching anything.
        for (index, item) in items.iter().enumerate() {
            if urls.values().any(|stored| stored == &item.original_url) {
                return Err(StorageError::Duplicate(item.original_url.clone()));
            }
            if urls.contains_key(&item.short_code) {
                return Err(StorageError::CodeTaken(item.short_code.clone()));
            }
            for earlier in &items[..index] {
                if earlier.original_url == item.original_url {
                    return Err(StorageError::Duplicate(item.original_url.clone()));
                }
                if earlier.short_code == item.short_code {
                    return Err(StorageError::CodeTaken(item.short_code.clone()));
                }
            }
        }

        for item in items {
            urls.insert(item.short_code.clone(), item.original_url.clone());
        }
        Ok(())
    }

    async fn lookup_by_short(&self, short: &str) -> Result<Option<Resolved>> {
        let urls = self.urls.read().await;
        Ok(urls.get(short).map(|original| Resolved {
            original_url: original.clone(),
            deleted: false,
        }))
    }

    async fn lookup_by_original(&self, original: &str) -> Result<Option<String>> {
        let urls = self.urls.read().await;
        Ok(urls
            .iter()
            .find(|(_, stored)| stored.as_str() == original)
            .map(|(short, _)| short.clone()))
    }

    async fn list_by_owner(&self, _owner: &str) -> Result<Vec<OwnedUrl>> {
        Err(Self::unsupported("owner listing"))
    }

    async fn mark_deleted(&self, _shorts: &[String]) -> Result<()> {
        Err(Self::unsupported("soft deletion"))
    }

    async fn stats(&self) -> Result<StatSnapshot> {
        Err(Self::unsupported("stats"))
    }

    async fn check_connectivity(&self) -> Result<()> {
        Err(Self::unsupported("connectivity probe"))
    }

    async fn ensure_schema(&self) -> Result<()> {
        // Nothing to create for a plain map.
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.urls.write().await.clear();
        Ok(())
    }
}

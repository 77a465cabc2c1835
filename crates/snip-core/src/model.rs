use serde::{Deserialize, Serialize};

/// Input unit for a batch insert. Exists only for the duration of one
/// batch call; carries no identity beyond its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub original_url: String,
    pub short_code: String,
    pub owner_id: String,
}

/// Result of looking a short code up in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The original URL bound to the short code.
    pub original_url: String,
    /// Whether the mapping has been soft-deleted. A deleted mapping is
    /// "gone", distinct from a code that never existed.
    pub deleted: bool,
}

/// One shortened URL owned by a user, as returned by owner listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedUrl {
    #[serde(rename = "short_url")]
    pub short_code: String,
    pub original_url: String,
}

/// Service-wide counters, recomputed on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSnapshot {
    /// Total number of shortened URLs, soft-deleted rows included.
    #[serde(rename = "urls")]
    pub total_urls: i64,
    /// Number of distinct owners that shortened at least one URL.
    #[serde(rename = "users")]
    pub distinct_owners: i64,
}

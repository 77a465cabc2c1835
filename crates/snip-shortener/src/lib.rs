//! URL shortener service layer.
//!
//! This crate orchestrates a [`snip_core::Storage`] backend: dedup-aware
//! shortening, batch inserts, resolution with soft-delete semantics, the
//! background deletion pipeline, and the journal-backed restore that
//! makes any backend durable across restarts.

pub mod config;
mod deletion;
pub mod error;
pub mod generator;
pub mod journal;
pub mod logging;
pub mod service;

pub use config::{AppConfig, StorageBackend};
pub use error::ServiceError;
pub use generator::{CodeGenerator, UuidPrefixGenerator};
pub use journal::{Journal, JournalRecord};
pub use service::{Resolution, Shortened, ShortenerService};

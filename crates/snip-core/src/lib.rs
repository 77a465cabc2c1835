//! Core types and traits for the snip URL shortener.
//!
//! This crate provides the storage contract and the shared models used
//! by the shortener service and the concrete storage backends.

pub mod error;
pub mod model;
pub mod storage;

pub use error::{Result, StorageError};
pub use model::{BatchItem, OwnedUrl, Resolved, StatSnapshot};
pub use storage::Storage;

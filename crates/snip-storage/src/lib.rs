pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;

pub use snip_core::{Result, Storage, StorageError};

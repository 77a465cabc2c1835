use std::path::PathBuf;

use clap::Parser;

pub const SERVER_ADDRESS_ENV: &str = "SERVER_ADDRESS";
pub const BASE_URL_ENV: &str = "BASE_URL";
pub const FILE_STORAGE_PATH_ENV: &str = "FILE_STORAGE_PATH";
pub const DATABASE_DSN_ENV: &str = "DATABASE_DSN";

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";

/// Service configuration, resolved once at startup from flags with
/// environment fallbacks.
#[derive(Debug, Clone, Parser)]
#[command(name = "snip")]
pub struct AppConfig {
    /// Address the transport adapter listens on.
    #[arg(short = 'a', long, env = SERVER_ADDRESS_ENV, default_value = DEFAULT_SERVER_ADDRESS)]
    pub server_address: String,

    /// Base URL adapters prepend to short codes; when empty they fall
    /// back to the request host.
    #[arg(short = 'b', long, env = BASE_URL_ENV, default_value = "")]
    pub base_url: String,

    /// Durability log path. Journaling is disabled when unset.
    #[arg(short = 'f', long, env = FILE_STORAGE_PATH_ENV)]
    pub file_storage_path: Option<PathBuf>,

    /// Relational DSN. Presence selects the Postgres backend; absence
    /// selects the volatile in-memory backend.
    #[arg(short = 'd', long, env = DATABASE_DSN_ENV)]
    pub database_dsn: Option<String>,
}

/// The backend the process runs on, decided once and never swapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres(String),
    InMemory,
}

impl AppConfig {
    pub fn storage_backend(&self) -> StorageBackend {
        match self.database_dsn.as_deref() {
            Some(dsn) if !dsn.is_empty() => StorageBackend::Postgres(dsn.to_string()),
            _ => StorageBackend::InMemory,
        }
    }
}

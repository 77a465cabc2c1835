use async_trait::async_trait;
use sqlx::{PgPool, Row};

use snip_core::error::{Result, StorageError};
use snip_core::model::{BatchItem, OwnedUrl, Resolved, StatSnapshot};
use snip_core::storage::Storage;

/// Unique index on the original URL; a violation here means the URL is
/// already shortened and the existing code should be returned.
const ORIGINAL_IDX: &str = "short_urls_original_idx";
/// Unique index on the short code; a violation here means a code
/// collision with a different original URL.
const SHORT_IDX: &str = "short_urls_short_idx";

/// Relational backend on Postgres.
///
/// Invariant enforcement is delegated to the unique indexes: the service
/// never sees driver error codes, only the [`StorageError::Duplicate`]
/// and [`StorageError::CodeTaken`] sentinels derived from them. Batch
/// inserts and soft deletes run one transaction per call, one statement
/// execution per item, rolled back on the first error.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates a backend from an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a backend by opening a new connection pool.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPool::connect(dsn).await.map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

/// Maps an insert failure, turning unique-constraint violations into
/// the duplicate/collision sentinels the service recovers from.
fn map_insert_error(err: sqlx::Error, original: &str, short: &str) -> StorageError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some(name) if name == SHORT_IDX => StorageError::CodeTaken(short.to_string()),
                // The original-URL index, or an unnamed constraint from
                // an externally managed schema.
                _ => StorageError::Duplicate(original.to_string()),
            };
        }
    }
    map_sqlx_error(err)
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn insert_one(&self, original: &str, short: &str, owner: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO short_urls (short, original, owner)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(short)
        .bind(original)
        .bind(owner)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => Err(map_insert_error(err, original, short)),
        }
    }

    async fn insert_batch(&self, items: &[BatchItem]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO short_urls (short, original, owner)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(&item.short_code)
            .bind(&item.original_url)
            .bind(&item.owner_id)
            .execute(&mut *tx)
            .await
            .map_err(|err| map_insert_error(err, &item.original_url, &item.short_code))?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn lookup_by_short(&self, short: &str) -> Result<Option<Resolved>> {
        let row = sqlx::query(
            r#"
            SELECT original, deleted
            FROM short_urls
            WHERE short = $1
            "#,
        )
        .bind(short)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Resolved {
            original_url: row.try_get("original").map_err(map_sqlx_error)?,
            deleted: row.try_get("deleted").map_err(map_sqlx_error)?,
        }))
    }

    async fn lookup_by_original(&self, original: &str) -> Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT short
            FROM short_urls
            WHERE original = $1
            "#,
        )
        .bind(original)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|row| row.try_get("short").map_err(map_sqlx_error))
            .transpose()
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<OwnedUrl>> {
        let rows = sqlx::query(
            r#"
            SELECT short, original
            FROM short_urls
            WHERE owner = $1
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                Ok(OwnedUrl {
                    short_code: row.try_get("short").map_err(map_sqlx_error)?,
                    original_url: row.try_get("original").map_err(map_sqlx_error)?,
                })
            })
            .collect()
    }

    async fn mark_deleted(&self, shorts: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // Unknown codes update zero rows, which keeps the call
        // idempotent.
        for short in shorts {
            sqlx::query(
                r#"
                UPDATE short_urls
                SET deleted = TRUE
                WHERE short = $1
                "#,
            )
            .bind(short)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn stats(&self) -> Result<StatSnapshot> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(short) AS urls, COUNT(DISTINCT owner) AS users
            FROM short_urls
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(StatSnapshot {
            total_urls: row.try_get("urls").map_err(map_sqlx_error)?,
            distinct_owners: row.try_get("users").map_err(map_sqlx_error)?,
        })
    }

    async fn check_connectivity(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS short_urls
            (
                short    TEXT    NOT NULL,
                original TEXT    NOT NULL,
                owner    TEXT    NOT NULL,
                deleted  BOOLEAN NOT NULL DEFAULT FALSE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {ORIGINAL_IDX} ON short_urls (original)"
        ))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {SHORT_IDX} ON short_urls (short)"
        ))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM short_urls")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

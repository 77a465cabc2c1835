//! Integration tests against a live Postgres instance.
//!
//! These run only when `SNIP_TEST_DATABASE_DSN` points at a database the
//! tests may freely wipe; without it every test is a silent no-op. The
//! phases run sequentially inside one test because they share the
//! `short_urls` table.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

use snip_core::{BatchItem, Storage, StorageError};
use snip_storage::PostgresStorage;

const DSN_ENV: &str = "SNIP_TEST_DATABASE_DSN";

async fn storage() -> Option<PostgresStorage> {
    let dsn = std::env::var(DSN_ENV).ok()?;
    let pool = connect_with_retry(&dsn).await;
    Some(PostgresStorage::new(pool))
}

async fn connect_with_retry(dsn: &str) -> sqlx::PgPool {
    let mut last_error = None;

    for _ in 0..20 {
        match PgPoolOptions::new().max_connections(5).connect(dsn).await {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect to postgres: {last_error:?}");
}

fn item(original: &str, short: &str, owner: &str) -> BatchItem {
    BatchItem {
        original_url: original.to_string(),
        short_code: short.to_string(),
        owner_id: owner.to_string(),
    }
}

#[tokio::test]
async fn relational_backend_end_to_end() {
    let Some(storage) = storage().await else {
        eprintln!("{DSN_ENV} not set, skipping postgres integration test");
        return;
    };

    // Schema creation is idempotent.
    storage.ensure_schema().await.expect("create schema");
    storage.ensure_schema().await.expect("re-run schema");
    storage.clear().await.expect("clear table");

    storage.check_connectivity().await.expect("connectivity");

    // Insert and both lookup directions.
    storage
        .insert_one("https://example.com/a", "abc123", "u1")
        .await
        .expect("insert");
    let resolved = storage
        .lookup_by_short("abc123")
        .await
        .expect("lookup")
        .expect("mapping present");
    assert_eq!(resolved.original_url, "https://example.com/a");
    assert!(!resolved.deleted);
    assert_eq!(
        storage
            .lookup_by_original("https://example.com/a")
            .await
            .expect("lookup")
            .as_deref(),
        Some("abc123")
    );

    // The unique index on the original URL surfaces as Duplicate.
    let err = storage
        .insert_one("https://example.com/a", "other1", "u2")
        .await
        .expect_err("duplicate original");
    assert!(matches!(err, StorageError::Duplicate(_)));

    // The unique index on the short code surfaces as CodeTaken.
    let err = storage
        .insert_one("https://example.com/b", "abc123", "u1")
        .await
        .expect_err("taken code");
    assert!(matches!(err, StorageError::CodeTaken(_)));

    // A batch with one conflicting item commits nothing.
    let err = storage
        .insert_batch(&[
            item("https://example.com/c", "ccc333", "u1"),
            item("https://example.com/a", "ddd444", "u1"),
        ])
        .await
        .expect_err("batch conflict");
    assert!(matches!(err, StorageError::Duplicate(_)));
    assert!(storage
        .lookup_by_short("ccc333")
        .await
        .expect("lookup")
        .is_none());

    // A clean batch commits every item.
    storage
        .insert_batch(&[
            item("https://example.com/c", "ccc333", "u2"),
            item("https://example.com/d", "ddd444", "u2"),
        ])
        .await
        .expect("batch insert");

    // Owner listing only returns that owner's mappings.
    let owned = storage.list_by_owner("u2").await.expect("list");
    assert_eq!(owned.len(), 2);
    assert!(owned.iter().any(|u| u.short_code == "ccc333"));
    assert!(owned.iter().any(|u| u.short_code == "ddd444"));

    // Stats: 5 codes across 3 distinct owners.
    storage
        .insert_batch(&[
            item("https://example.com/e", "eee555", "u3"),
            item("https://example.com/f", "fff666", "u3"),
        ])
        .await
        .expect("batch insert");
    let stats = storage.stats().await.expect("stats");
    assert_eq!(stats.total_urls, 5);
    assert_eq!(stats.distinct_owners, 3);

    // Soft delete flips the flag without removing the row; repeating
    // the call and naming unknown codes changes nothing.
    let batch = vec!["abc123".to_string(), "unknown".to_string()];
    storage.mark_deleted(&batch).await.expect("mark deleted");
    storage.mark_deleted(&batch).await.expect("repeat delete");

    let resolved = storage
        .lookup_by_short("abc123")
        .await
        .expect("lookup")
        .expect("row survives soft delete");
    assert!(resolved.deleted);
    assert_eq!(resolved.original_url, "https://example.com/a");

    // Deleted rows still count toward stats and still hold the unique
    // index on their original URL.
    let stats = storage.stats().await.expect("stats");
    assert_eq!(stats.total_urls, 5);
    let err = storage
        .insert_one("https://example.com/a", "ggg777", "u4")
        .await
        .expect_err("deleted original still blocks re-shortening");
    assert!(matches!(err, StorageError::Duplicate(_)));

    storage.clear().await.expect("clear table");
    let stats = storage.stats().await.expect("stats");
    assert_eq!(stats.total_urls, 0);
}

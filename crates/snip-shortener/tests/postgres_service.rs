//! End-to-end service test against a live Postgres instance.
//!
//! Runs only when `SNIP_TEST_DATABASE_DSN` points at a database the test
//! may freely wipe; otherwise it is a silent no-op.

use std::time::Duration;

use snip_core::Storage;
use snip_shortener::{Resolution, ShortenerService};
use snip_storage::PostgresStorage;

const DSN_ENV: &str = "SNIP_TEST_DATABASE_DSN";

#[tokio::test]
async fn shorten_resolve_delete_scenario() {
    let Some(dsn) = std::env::var(DSN_ENV).ok() else {
        eprintln!("{DSN_ENV} not set, skipping postgres service test");
        return;
    };

    let storage = PostgresStorage::connect(&dsn).await.expect("connect");
    storage.ensure_schema().await.expect("schema");
    storage.clear().await.expect("clear");

    let service = ShortenerService::new(storage.clone(), None);
    service.bootstrap().await.expect("bootstrap");
    service.check_health().await.expect("health");

    // First shorten binds the code.
    let outcome = service
        .shorten("https://example.com/a", "abc123", "u1")
        .await
        .expect("shorten");
    assert_eq!(outcome.short_code, "abc123");
    assert!(!outcome.existed);

    // Repeating the request surfaces the existing code as a conflict.
    let outcome = service
        .shorten("https://example.com/a", "other9", "u2")
        .await
        .expect("repeat shorten");
    assert_eq!(outcome.short_code, "abc123");
    assert!(outcome.existed);

    assert_eq!(
        service.resolve("abc123").await.expect("resolve"),
        Resolution::Found("https://example.com/a".to_string())
    );

    // Queue the deletion and wait for the pipeline to flush it.
    service.enqueue_delete(vec!["abc123".to_string()]).await;
    let mut resolution = service.resolve("abc123").await.expect("resolve");
    for _ in 0..50 {
        if resolution == Resolution::Gone {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        resolution = service.resolve("abc123").await.expect("resolve");
    }
    assert_eq!(resolution, Resolution::Gone);

    // Deleting again is a no-op, as is deleting an unknown code.
    service
        .enqueue_delete(vec!["abc123".to_string(), "unknown".to_string()])
        .await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        service.resolve("abc123").await.expect("resolve"),
        Resolution::Gone
    );

    // Owner listing and stats still see the soft-deleted row.
    let owned = service.list_by_owner("u1").await.expect("list");
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].short_code, "abc123");

    let stats = service.stats().await.expect("stats");
    assert_eq!(stats.total_urls, 1);
    assert_eq!(stats.distinct_owners, 1);

    storage.clear().await.expect("clear");
}

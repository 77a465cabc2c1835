use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

use snip_core::Storage;

/// Queued delete requests the caller has not waited for. Enqueuing past
/// this capacity applies backpressure (the send awaits) rather than
/// dropping silently.
const QUEUE_CAPACITY: usize = 5;
/// Batching window: accumulated codes are flushed at most this often,
/// so a burst of deletes costs one storage round-trip, not one per code.
const FLUSH_INTERVAL: Duration = Duration::from_millis(100);
/// A batch also flushes early once it reaches this size.
const MAX_BATCH: usize = 64;

/// Bounded queue feeding the single background soft-delete worker.
///
/// The worker is the sole writer of soft-delete state for the lifetime
/// of the service. Flush failures are logged and the batch is dropped:
/// deletion is best-effort, at-most-once.
#[derive(Debug, Clone)]
pub(crate) struct DeletionQueue {
    tx: mpsc::Sender<String>,
}

impl DeletionQueue {
    /// Spawns the worker and returns the queue handle. Must be called
    /// from within a Tokio runtime.
    pub(crate) fn start<S: Storage>(storage: Arc<S>) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(run_worker(storage, rx));
        Self { tx }
    }

    /// Hands one short code to the worker. Awaits while the queue is
    /// full; returns as soon as the code is buffered, without waiting
    /// for the deletion to land in storage.
    pub(crate) async fn push(&self, short: String) {
        if self.tx.send(short).await.is_err() {
            // Only reachable once the worker has exited.
            warn!("deletion worker is gone, dropping delete request");
        }
    }
}

async fn run_worker<S: Storage>(storage: Arc<S>, mut rx: mpsc::Receiver<String>) {
    let mut batch: Vec<String> = Vec::new();
    // First tick one interval out, so a fresh burst is not flushed
    // item-by-item.
    let mut ticker = time::interval_at(Instant::now() + FLUSH_INTERVAL, FLUSH_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(short) => {
                    debug!(short, "queued for soft deletion");
                    batch.push(short);
                    if batch.len() >= MAX_BATCH {
                        flush(storage.as_ref(), &mut batch).await;
                    }
                }
                None => {
                    // Service dropped; flush what is left and exit.
                    flush(storage.as_ref(), &mut batch).await;
                    break;
                }
            },
            _ = ticker.tick() => {
                flush(storage.as_ref(), &mut batch).await;
            }
        }
    }
}

async fn flush<S: Storage>(storage: &S, batch: &mut Vec<String>) {
    if batch.is_empty() {
        return;
    }
    debug!(count = batch.len(), "flushing soft-delete batch");
    if let Err(err) = storage.mark_deleted(batch).await {
        // At-most-once: the batch is dropped, never retried.
        error!(error = %err, count = batch.len(), "soft-delete flush failed, dropping batch");
    }
    batch.clear();
}

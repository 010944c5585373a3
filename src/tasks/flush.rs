//! Write-Back Flush Task
//!
//! Background task that periodically reconciles pending overflow keys with
//! the durable store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::engine::{FlushReport, OverflowStore};

/// Handle to a running flush task.
///
/// Dropping the handle also stops the task after its current cycle.
#[derive(Debug)]
pub struct FlushHandle {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<FlushReport>,
}

impl FlushHandle {
    /// Signals the task to stop and waits for it.
    ///
    /// A cycle already in progress completes, then one final flush drains
    /// whatever is still queued. Returns the report of that final flush.
    pub async fn shutdown(self) -> Result<FlushReport, JoinError> {
        let _ = self.shutdown.send(true);
        self.handle.await
    }
}

/// Spawns a background task that flushes `overflow` every `period`.
///
/// Cycles never overlap: the next tick is not awaited until the current
/// flush returns, and late ticks are delayed rather than bunched.
///
/// # Example
/// ```ignore
/// let overflow = Arc::new(OverflowStore::new(store));
/// let flusher = spawn_flush_task(overflow.clone(), Duration::from_secs(10));
/// // Later, during shutdown:
/// let report = flusher.shutdown().await?;
/// ```
pub fn spawn_flush_task(overflow: Arc<OverflowStore>, period: Duration) -> FlushHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        info!("Starting write-back flush task with interval of {:?}", period);

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = overflow.flush().await;
                    if report.requeued > 0 {
                        warn!("Write-back flush: requeued {} keys", report.requeued);
                    } else if report.upserted + report.deleted > 0 {
                        info!(
                            "Write-back flush: saved {} records, deleted {}",
                            report.upserted, report.deleted
                        );
                    } else {
                        debug!("Write-back flush: nothing pending");
                    }
                }
                _ = shutdown_rx.changed() => break,
            }
        }

        let report = overflow.flush().await;
        if report.requeued > 0 {
            error!(
                "Write-back flush task stopped with {} keys unpersisted",
                report.requeued
            );
        } else {
            info!(
                "Write-back flush task stopped after final flush (saved {}, deleted {})",
                report.upserted, report.deleted
            );
        }
        report
    });

    FlushHandle { shutdown, handle }
}

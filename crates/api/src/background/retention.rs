//! Periodic cleanup of in-memory state.
//!
//! Evicts expired video operations from the tracker and drops quota
//! records from previous UTC days.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mediagen_core::quota::QuotaGate;
use tokio_util::sync::CancellationToken;

use crate::tracker::OperationTracker;

/// How often the cleanup runs.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Run the retention loop until `cancel` is triggered.
pub async fn run(tracker: Arc<OperationTracker>, quota: Arc<QuotaGate>, cancel: CancellationToken) {
    run_every(CLEANUP_INTERVAL, tracker, quota, cancel).await;
}

pub async fn run_every(
    period: Duration,
    tracker: Arc<OperationTracker>,
    quota: Arc<QuotaGate>,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = period.as_secs(), "Retention job started");

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Retention job stopping");
                break;
            }
            _ = interval.tick() => {
                sweep(&tracker, &quota).await;
            }
        }
    }
}

async fn sweep(tracker: &OperationTracker, quota: &QuotaGate) {
    let now = Utc::now();

    let evicted = tracker.evict_expired(now).await;
    if evicted > 0 {
        tracing::info!(evicted, "Retention: evicted expired operations");
    } else {
        tracing::debug!("Retention: no operations to evict");
    }

    match quota.purge_stale(now.date_naive()) {
        Ok(0) => {}
        Ok(purged) => tracing::info!(purged, "Retention: purged stale quota records"),
        Err(e) => tracing::error!(error = %e, "Retention: quota purge failed"),
    }
}

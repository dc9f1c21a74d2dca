//! Periodic purge of expired tombstones.
//!
//! Only started when a retention period is configured. Clients whose cursor
//! predates the same horizon are sent a full snapshot, so a purged deletion
//! is never silently missed.

use std::time::Duration;

use chrono::Utc;
use notesync_core::retention::RetentionPolicy;
use notesync_db::repositories::TombstoneRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Run the purge loop every `interval` until `cancel` is triggered.
pub async fn run(
    pool: PgPool,
    policy: RetentionPolicy,
    interval: Duration,
    cancel: CancellationToken,
) {
    let Some(retention_days) = policy.retention_days() else {
        tracing::info!("Tombstone retention disabled; tombstones are kept forever");
        return;
    };

    tracing::info!(
        retention_days,
        interval_secs = interval.as_secs(),
        "Tombstone retention job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Tombstone retention job stopping");
                break;
            }
            _ = ticker.tick() => {
                let Some(cutoff) = policy.horizon(Utc::now()) else {
                    continue;
                };
                match TombstoneRepo::purge_older_than(&pool, cutoff).await {
                    Ok(report) if report.total_count > 0 => {
                        for entry in &report.counts_by_table {
                            tracing::debug!(table = entry.table, count = entry.count, "Purged tombstones");
                        }
                        tracing::info!(total = report.total_count, %cutoff, "Tombstone retention: purged rows");
                    }
                    Ok(_) => {
                        tracing::debug!(%cutoff, "Tombstone retention: nothing to purge");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Tombstone retention: purge failed");
                    }
                }
            }
        }
    }
}

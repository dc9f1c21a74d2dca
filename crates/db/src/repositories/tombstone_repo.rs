//! Repository for purging expired tombstones across the synced tables.
//!
//! Tombstoned rows are hard-deleted once they are older than the retention
//! cutoff. Tables are visited leaves first, and a parent row is only purged
//! once nothing references it any more, so a purge never cascades into (or
//! silently nullifies) a row a client still holds.

use notesync_core::types::Timestamp;
use serde::Serialize;
use sqlx::PgPool;

/// FK-safe purge order with the guard each table needs: leaves first,
/// roots last.
const PURGE_PLAN: &[(&str, &str)] = &[
    ("note_categories", ""),
    ("reminders", ""),
    (
        "schedules",
        "AND NOT EXISTS (SELECT 1 FROM reminders r WHERE r.schedule_id = schedules.id)",
    ),
    (
        "notes",
        "AND NOT EXISTS (SELECT 1 FROM schedules s WHERE s.note_id = notes.id) \
         AND NOT EXISTS (SELECT 1 FROM reminders r WHERE r.note_id = notes.id) \
         AND NOT EXISTS (SELECT 1 FROM note_categories nc WHERE nc.note_id = notes.id)",
    ),
    (
        "categories",
        "AND NOT EXISTS (SELECT 1 FROM note_categories nc WHERE nc.category_id = categories.id)",
    ),
    (
        "note_types",
        "AND NOT EXISTS (SELECT 1 FROM notes n WHERE n.note_type_id = note_types.id)",
    ),
];

/// Per-table count of purged rows.
#[derive(Debug, Clone, Serialize)]
pub struct PurgeCount {
    pub table: &'static str,
    pub count: u64,
}

/// Summary returned by [`TombstoneRepo::purge_older_than`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct PurgeReport {
    pub counts_by_table: Vec<PurgeCount>,
    pub total_count: u64,
}

/// Provides cross-table tombstone maintenance.
pub struct TombstoneRepo;

impl TombstoneRepo {
    /// Hard-delete every tombstone with `deleted_at < cutoff`, in one
    /// transaction.
    pub async fn purge_older_than(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<PurgeReport, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut report = PurgeReport::default();

        for &(table, guard) in PURGE_PLAN {
            let sql = format!("DELETE FROM {table} WHERE deleted_at < $1 {guard}");
            let result = sqlx::query(&sql).bind(cutoff).execute(&mut *tx).await?;
            let count = result.rows_affected();
            if count > 0 {
                report.counts_by_table.push(PurgeCount { table, count });
                report.total_count += count;
            }
        }

        tx.commit().await?;
        Ok(report)
    }
}

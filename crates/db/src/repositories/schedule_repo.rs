//! Repository for the `schedules` table.
//!
//! Schedules are owned through their note.

use notesync_core::types::{AccountId, EntityId, Timestamp};
use sqlx::PgConnection;

use crate::models::schedule::Schedule;

/// Column list for schedules queries, qualified for joins.
const COLUMNS: &str = "s.id, s.note_id, s.start_date_time, s.end_date_time, s.recurrence_type, \
                       s.recurrence_interval, s.recurrence_day, s.recurrence_end_date, \
                       s.created_at, s.updated_at, s.deleted_at";

/// Provides sync operations for schedules.
pub struct ScheduleRepo;

impl ScheduleRepo {
    /// Find a schedule by its ID, tombstoned or not.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: EntityId,
    ) -> Result<Option<Schedule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM schedules s WHERE s.id = $1");
        sqlx::query_as::<_, Schedule>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Insert or overwrite a schedule on behalf of `account_id`.
    ///
    /// An existing row whose note belongs to another account is left alone
    /// and `false` is returned. The caller checks the new `note_id`.
    pub async fn upsert(
        conn: &mut PgConnection,
        account_id: AccountId,
        row: &Schedule,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO schedules
                (id, note_id, start_date_time, end_date_time, recurrence_type,
                 recurrence_interval, recurrence_day, recurrence_end_date,
                 created_at, updated_at, deleted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             ON CONFLICT (id) DO UPDATE SET
                note_id = EXCLUDED.note_id,
                start_date_time = EXCLUDED.start_date_time,
                end_date_time = EXCLUDED.end_date_time,
                recurrence_type = EXCLUDED.recurrence_type,
                recurrence_interval = EXCLUDED.recurrence_interval,
                recurrence_day = EXCLUDED.recurrence_day,
                recurrence_end_date = EXCLUDED.recurrence_end_date,
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at,
                deleted_at = EXCLUDED.deleted_at
             WHERE EXISTS (
                SELECT 1 FROM notes n
                WHERE n.id = schedules.note_id AND n.account_id = $12
             )",
        )
        .bind(row.id)
        .bind(row.note_id)
        .bind(row.start_date_time)
        .bind(row.end_date_time)
        .bind(row.recurrence_type)
        .bind(row.recurrence_interval)
        .bind(row.recurrence_day)
        .bind(row.recurrence_end_date)
        .bind(row.created_at)
        .bind(row.updated_at)
        .bind(row.deleted_at)
        .bind(account_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Schedules of notes owned by `account_id` modified or tombstoned after
    /// `cursor`.
    pub async fn changed_since(
        conn: &mut PgConnection,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<Schedule>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM schedules s
             JOIN notes n ON n.id = s.note_id
             WHERE n.account_id = $1
               AND ($2::timestamptz IS NULL OR s.updated_at > $2 OR s.deleted_at > $2)
             ORDER BY s.updated_at ASC"
        );
        sqlx::query_as::<_, Schedule>(&query)
            .bind(account_id)
            .bind(cursor)
            .fetch_all(conn)
            .await
    }

    /// Every schedule of the given notes, tombstones included.
    pub async fn list_for_notes(
        conn: &mut PgConnection,
        note_ids: &[EntityId],
    ) -> Result<Vec<Schedule>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM schedules s
             WHERE s.note_id = ANY($1)
             ORDER BY s.updated_at ASC"
        );
        sqlx::query_as::<_, Schedule>(&query)
            .bind(note_ids)
            .fetch_all(conn)
            .await
    }

    /// Account owning the schedule's note, or `None` if there is no such
    /// schedule.
    pub async fn owner_of(
        conn: &mut PgConnection,
        id: EntityId,
    ) -> Result<Option<AccountId>, sqlx::Error> {
        let row: Option<(AccountId,)> = sqlx::query_as(
            "SELECT n.account_id FROM schedules s
             JOIN notes n ON n.id = s.note_id
             WHERE s.id = $1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(row.map(|(account_id,)| account_id))
    }

    /// Tombstone a schedule whose note is owned by `account_id`.
    pub async fn mark_deleted(
        conn: &mut PgConnection,
        account_id: AccountId,
        id: EntityId,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE schedules s SET deleted_at = $3, updated_at = GREATEST(s.updated_at, $3)
             FROM notes n
             WHERE s.id = $1 AND n.id = s.note_id AND n.account_id = $2",
        )
        .bind(id)
        .bind(account_id)
        .bind(at)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

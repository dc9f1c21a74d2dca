//! Repository for the `reminders` table.

use notesync_core::types::{AccountId, EntityId, Timestamp};
use sqlx::PgConnection;

use crate::models::reminder::Reminder;

/// Column list for reminders queries.
const COLUMNS: &str = "id, account_id, note_id, schedule_id, offset_value, offset_unit, \
                       is_notification, created_at, updated_at, deleted_at";

/// Provides sync operations for reminders.
pub struct ReminderRepo;

impl ReminderRepo {
    /// Find a reminder by its ID, tombstoned or not, whoever owns it.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: EntityId,
    ) -> Result<Option<Reminder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reminders WHERE id = $1");
        sqlx::query_as::<_, Reminder>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Insert or overwrite a reminder. An existing row owned by another
    /// account is left alone and `false` is returned.
    pub async fn upsert(conn: &mut PgConnection, row: &Reminder) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO reminders
                (id, account_id, note_id, schedule_id, offset_value, offset_unit,
                 is_notification, created_at, updated_at, deleted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (id) DO UPDATE SET
                note_id = EXCLUDED.note_id,
                schedule_id = EXCLUDED.schedule_id,
                offset_value = EXCLUDED.offset_value,
                offset_unit = EXCLUDED.offset_unit,
                is_notification = EXCLUDED.is_notification,
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at,
                deleted_at = EXCLUDED.deleted_at
             WHERE reminders.account_id = EXCLUDED.account_id",
        )
        .bind(row.id)
        .bind(row.account_id)
        .bind(row.note_id)
        .bind(row.schedule_id)
        .bind(row.offset_value)
        .bind(row.offset_unit)
        .bind(row.is_notification)
        .bind(row.created_at)
        .bind(row.updated_at)
        .bind(row.deleted_at)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Reminders owned by `account_id` modified or tombstoned after `cursor`.
    pub async fn changed_since(
        conn: &mut PgConnection,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<Reminder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reminders
             WHERE account_id = $1
               AND ($2::timestamptz IS NULL OR updated_at > $2 OR deleted_at > $2)
             ORDER BY updated_at ASC"
        );
        sqlx::query_as::<_, Reminder>(&query)
            .bind(account_id)
            .bind(cursor)
            .fetch_all(conn)
            .await
    }

    /// Set the tombstone on an owned reminder.
    pub async fn mark_deleted(
        conn: &mut PgConnection,
        account_id: AccountId,
        id: EntityId,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE reminders SET deleted_at = $3, updated_at = GREATEST(updated_at, $3)
             WHERE id = $1 AND account_id = $2",
        )
        .bind(id)
        .bind(account_id)
        .bind(at)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

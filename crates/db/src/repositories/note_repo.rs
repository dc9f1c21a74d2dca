//! Repository for the `notes` table.

use notesync_core::types::{AccountId, EntityId, Timestamp};
use sqlx::PgConnection;

use crate::models::note::Note;

/// Column list for notes queries.
const COLUMNS: &str = "id, account_id, note_type_id, title, content, is_important, status, \
                       created_at, updated_at, deleted_at";

/// Provides sync operations for notes.
pub struct NoteRepo;

impl NoteRepo {
    /// Find a note by its ID, tombstoned or not, whoever owns it.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: EntityId,
    ) -> Result<Option<Note>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notes WHERE id = $1");
        sqlx::query_as::<_, Note>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Insert or overwrite a note. An existing row owned by another account
    /// is left alone and `false` is returned.
    pub async fn upsert(conn: &mut PgConnection, row: &Note) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO notes
                (id, account_id, note_type_id, title, content, is_important, status,
                 created_at, updated_at, deleted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (id) DO UPDATE SET
                note_type_id = EXCLUDED.note_type_id,
                title = EXCLUDED.title,
                content = EXCLUDED.content,
                is_important = EXCLUDED.is_important,
                status = EXCLUDED.status,
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at,
                deleted_at = EXCLUDED.deleted_at
             WHERE notes.account_id = EXCLUDED.account_id",
        )
        .bind(row.id)
        .bind(row.account_id)
        .bind(row.note_type_id)
        .bind(&row.title)
        .bind(&row.content)
        .bind(row.is_important)
        .bind(row.status)
        .bind(row.created_at)
        .bind(row.updated_at)
        .bind(row.deleted_at)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Notes owned by `account_id` modified or tombstoned after `cursor`.
    pub async fn changed_since(
        conn: &mut PgConnection,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<Note>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notes
             WHERE account_id = $1
               AND ($2::timestamptz IS NULL OR updated_at > $2 OR deleted_at > $2)
             ORDER BY updated_at ASC"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(account_id)
            .bind(cursor)
            .fetch_all(conn)
            .await
    }

    /// Set the tombstone on an owned note. Children are not touched.
    pub async fn mark_deleted(
        conn: &mut PgConnection,
        account_id: AccountId,
        id: EntityId,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notes SET deleted_at = $3, updated_at = GREATEST(updated_at, $3)
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

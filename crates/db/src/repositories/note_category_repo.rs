//! Repository for the `note_categories` link table.
//!
//! Links have no owner column; they belong to the account that owns their
//! note, so every account-scoped query joins through `notes`.

use notesync_core::types::{AccountId, EntityId, Timestamp};
use sqlx::PgConnection;

use crate::models::note_category::NoteCategory;

/// Column list for note_categories queries, qualified for joins.
const COLUMNS: &str = "nc.note_id, nc.category_id, nc.created_at, nc.deleted_at";

/// Provides sync operations for note/category links.
pub struct NoteCategoryRepo;

impl NoteCategoryRepo {
    /// Find one link by its composite key.
    pub async fn find(
        conn: &mut PgConnection,
        note_id: EntityId,
        category_id: EntityId,
    ) -> Result<Option<NoteCategory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM note_categories nc
             WHERE nc.note_id = $1 AND nc.category_id = $2"
        );
        sqlx::query_as::<_, NoteCategory>(&query)
            .bind(note_id)
            .bind(category_id)
            .fetch_optional(conn)
            .await
    }

    /// Insert or overwrite a link. The caller has already checked that the
    /// note and the category belong to the writing account.
    pub async fn upsert(conn: &mut PgConnection, row: &NoteCategory) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO note_categories (note_id, category_id, created_at, deleted_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (note_id, category_id) DO UPDATE SET
                created_at = EXCLUDED.created_at,
                deleted_at = EXCLUDED.deleted_at",
        )
        .bind(row.note_id)
        .bind(row.category_id)
        .bind(row.created_at)
        .bind(row.deleted_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Every link of one note, tombstones included.
    pub async fn list_for_note(
        conn: &mut PgConnection,
        note_id: EntityId,
    ) -> Result<Vec<NoteCategory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM note_categories nc
             WHERE nc.note_id = $1
             ORDER BY nc.created_at ASC"
        );
        sqlx::query_as::<_, NoteCategory>(&query)
            .bind(note_id)
            .fetch_all(conn)
            .await
    }

    /// Live links of the given notes.
    pub async fn live_for_notes(
        conn: &mut PgConnection,
        note_ids: &[EntityId],
    ) -> Result<Vec<NoteCategory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM note_categories nc
             WHERE nc.note_id = ANY($1) AND nc.deleted_at IS NULL
             ORDER BY nc.created_at ASC"
        );
        sqlx::query_as::<_, NoteCategory>(&query)
            .bind(note_ids)
            .fetch_all(conn)
            .await
    }

    /// Links of notes owned by `account_id` created or tombstoned after
    /// `cursor`.
    pub async fn changed_since(
        conn: &mut PgConnection,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<NoteCategory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM note_categories nc
             JOIN notes n ON n.id = nc.note_id
             WHERE n.account_id = $1
               AND ($2::timestamptz IS NULL OR nc.created_at > $2 OR nc.deleted_at > $2)
             ORDER BY nc.created_at ASC"
        );
        sqlx::query_as::<_, NoteCategory>(&query)
            .bind(account_id)
            .bind(cursor)
            .fetch_all(conn)
            .await
    }

    /// Account owning the link's note, or `None` if the link does not exist.
    pub async fn owner_of(
        conn: &mut PgConnection,
        note_id: EntityId,
        category_id: EntityId,
    ) -> Result<Option<AccountId>, sqlx::Error> {
        let row: Option<(AccountId,)> = sqlx::query_as(
            "SELECT n.account_id FROM note_categories nc
             JOIN notes n ON n.id = nc.note_id
             WHERE nc.note_id = $1 AND nc.category_id = $2",
        )
        .bind(note_id)
        .bind(category_id)
        .fetch_optional(conn)
        .await?;
        Ok(row.map(|(account_id,)| account_id))
    }

    /// Tombstone a link whose note is owned by `account_id`.
    pub async fn mark_deleted(
        conn: &mut PgConnection,
        account_id: AccountId,
        note_id: EntityId,
        category_id: EntityId,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE note_categories nc SET deleted_at = $4
             FROM notes n
             WHERE nc.note_id = $1 AND nc.category_id = $2
               AND n.id = nc.note_id AND n.account_id = $3",
        )
        .bind(note_id)
        .bind(category_id)
        .bind(account_id)
        .bind(at)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

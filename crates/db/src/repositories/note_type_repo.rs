//! Repository for the `note_types` table.
//!
//! Global note types (`account_id IS NULL`) are read-only to the sync path:
//! upserts and tombstones only ever match account-owned rows.

use notesync_core::entity::Ownership;
use notesync_core::types::{AccountId, EntityId, Timestamp};
use sqlx::PgConnection;

use crate::models::note_type::NoteType;

/// Column list for note_types queries.
const COLUMNS: &str = "id, account_id, name, created_at, updated_at, deleted_at";

/// Provides sync operations for note types.
pub struct NoteTypeRepo;

impl NoteTypeRepo {
    /// Find a note type by its ID, global or owned by anyone.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: EntityId,
    ) -> Result<Option<NoteType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM note_types WHERE id = $1");
        sqlx::query_as::<_, NoteType>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Insert or overwrite an account-owned note type.
    ///
    /// Returns `false` without writing when `row` is global or the id is
    /// already taken by a global type or another account.
    pub async fn upsert(conn: &mut PgConnection, row: &NoteType) -> Result<bool, sqlx::Error> {
        let Some(account_id) = row.owner.account_id() else {
            return Ok(false);
        };
        let result = sqlx::query(
            "INSERT INTO note_types (id, account_id, name, created_at, updated_at, deleted_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at,
                deleted_at = EXCLUDED.deleted_at
             WHERE note_types.account_id = EXCLUDED.account_id",
        )
        .bind(row.id)
        .bind(account_id)
        .bind(&row.name)
        .bind(row.created_at)
        .bind(row.updated_at)
        .bind(row.deleted_at)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Every global note type, tombstones included.
    pub async fn list_global(conn: &mut PgConnection) -> Result<Vec<NoteType>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM note_types WHERE account_id IS NULL ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, NoteType>(&query).fetch_all(conn).await
    }

    /// Note types owned by `account_id` modified or tombstoned after
    /// `cursor`. Global rows are never included.
    pub async fn changed_since(
        conn: &mut PgConnection,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<NoteType>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM note_types
             WHERE account_id = $1
               AND ($2::timestamptz IS NULL OR updated_at > $2 OR deleted_at > $2)
             ORDER BY updated_at ASC"
        );
        sqlx::query_as::<_, NoteType>(&query)
            .bind(account_id)
            .bind(cursor)
            .fetch_all(conn)
            .await
    }

    /// Ownership of a note type, or `None` if it does not exist.
    pub async fn owner_of(
        conn: &mut PgConnection,
        id: EntityId,
    ) -> Result<Option<Ownership>, sqlx::Error> {
        let row: Option<(Option<AccountId>,)> =
            sqlx::query_as("SELECT account_id FROM note_types WHERE id = $1")
                .bind(id)
                .fetch_optional(conn)
                .await?;
        Ok(row.map(|(account_id,)| Ownership::from(account_id)))
    }

    /// Set the tombstone on an owned note type. Global rows never match.
    pub async fn mark_deleted(
        conn: &mut PgConnection,
        account_id: AccountId,
        id: EntityId,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE note_types SET deleted_at = $3, updated_at = GREATEST(updated_at, $3)
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

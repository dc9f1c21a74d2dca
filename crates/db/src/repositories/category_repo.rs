//! Repository for the `categories` table.

use notesync_core::types::{AccountId, EntityId, Timestamp};
use sqlx::PgConnection;

use crate::models::category::Category;

/// Column list for categories queries.
const COLUMNS: &str = "id, account_id, name, created_at, updated_at, deleted_at";

/// Provides sync operations for categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// Find a category by its ID, tombstoned or not, whoever owns it.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: EntityId,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Insert or overwrite a category. An existing row owned by another
    /// account is left alone and `false` is returned.
    pub async fn upsert(conn: &mut PgConnection, row: &Category) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO categories (id, account_id, name, created_at, updated_at, deleted_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at,
                deleted_at = EXCLUDED.deleted_at
             WHERE categories.account_id = EXCLUDED.account_id",
        )
        .bind(row.id)
        .bind(row.account_id)
        .bind(&row.name)
        .bind(row.created_at)
        .bind(row.updated_at)
        .bind(row.deleted_at)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Rows owned by `account_id` modified or tombstoned after `cursor`.
    /// A `None` cursor returns every row, tombstones included.
    pub async fn changed_since(
        conn: &mut PgConnection,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM categories
             WHERE account_id = $1
               AND ($2::timestamptz IS NULL OR updated_at > $2 OR deleted_at > $2)
             ORDER BY updated_at ASC"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(account_id)
            .bind(cursor)
            .fetch_all(conn)
            .await
    }

    /// Of `ids`, those that are live and owned by `account_id`.
    pub async fn owned_live_ids(
        conn: &mut PgConnection,
        account_id: AccountId,
        ids: &[EntityId],
    ) -> Result<Vec<EntityId>, sqlx::Error> {
        let rows: Vec<(EntityId,)> = sqlx::query_as(
            "SELECT id FROM categories
             WHERE account_id = $1 AND id = ANY($2) AND deleted_at IS NULL",
        )
        .bind(account_id)
        .bind(ids)
        .fetch_all(conn)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Set the tombstone on an owned category. Returns `false` if no owned
    /// row matched.
    pub async fn mark_deleted(
        conn: &mut PgConnection,
        account_id: AccountId,
        id: EntityId,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE categories SET deleted_at = $3, updated_at = GREATEST(updated_at, $3)
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

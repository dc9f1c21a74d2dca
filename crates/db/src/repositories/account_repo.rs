//! Repository for the `accounts` table.

use notesync_core::types::{AccountId, Timestamp};
use sqlx::PgConnection;

use crate::models::account::{Account, CreateAccount};

/// Column list for accounts queries.
const COLUMNS: &str = "id, username, email, last_sync_at, created_at, updated_at";

/// Provides account lookups and cursor persistence.
pub struct AccountRepo;

impl AccountRepo {
    /// Find an account by its ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: AccountId,
    ) -> Result<Option<Account>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE id = $1");
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Create a new account, returning the created row.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateAccount,
    ) -> Result<Account, sqlx::Error> {
        let query = format!(
            "INSERT INTO accounts (username, email)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .fetch_one(conn)
            .await
    }

    /// Persist the cursor handed back by a sync. Returns `false` if the
    /// account does not exist.
    pub async fn set_last_sync_at(
        conn: &mut PgConnection,
        id: AccountId,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE accounts SET last_sync_at = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(at)
                .execute(conn)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

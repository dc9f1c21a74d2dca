use notesync_core::types::AccountId;

/// Failure of the persistence layer underneath a sync session.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The authenticated account does not exist. Nothing was written.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type SyncResult<T> = Result<T, SyncError>;

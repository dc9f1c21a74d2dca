use std::sync::Arc;

use notesync_sync::pg::PgStore;
use notesync_sync::SyncService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub pool: notesync_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Sync algorithm bound to the Postgres store.
    pub sync: Arc<SyncService<PgStore>>,
}

impl AppState {
    pub fn new(pool: notesync_db::DbPool, config: ServerConfig) -> Self {
        let sync = SyncService::new(PgStore::new(pool.clone()), config.sync);
        Self {
            pool,
            config: Arc::new(config),
            sync: Arc::new(sync),
        }
    }
}

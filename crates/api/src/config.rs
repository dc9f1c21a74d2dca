use notesync_core::cursor::CursorStrategy;
use notesync_core::retention::RetentionPolicy;
use notesync_sync::SyncConfig;

use crate::auth::jwt::JwtConfig;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration loaded from environment variables.
///
/// Everything except `DATABASE_URL` and `JWT_SECRET` has a default suitable
/// for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Postgres connection string.
    pub database_url: String,
    /// Connection pool size (default: `20`).
    pub database_max_connections: u32,
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Bearer token verification.
    pub jwt: JwtConfig,
    /// Cursor strategy and tombstone retention.
    pub sync: SyncConfig,
    /// How often the tombstone purge job runs (default: `3600`).
    pub tombstone_purge_interval_secs: u64,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `DATABASE_URL`                  | **required**            |
    /// | `DATABASE_MAX_CONNECTIONS`      | `20`                    |
    /// | `HOST`                          | `0.0.0.0`               |
    /// | `PORT`                          | `3000`                  |
    /// | `CORS_ORIGINS`                  | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`          | `30`                    |
    /// | `JWT_SECRET`                    | **required**            |
    /// | `SYNC_CURSOR_STRATEGY`          | `invocation_time`       |
    /// | `TOMBSTONE_RETENTION_DAYS`      | unset (keep forever)    |
    /// | `TOMBSTONE_PURGE_INTERVAL_SECS` | `3600`                  |
    /// | `LOG_FORMAT`                    | `text`                  |
    ///
    /// # Panics
    ///
    /// Panics on a missing required variable or an unparsable value, so a
    /// misconfigured server never starts.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let database_max_connections: u32 = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .expect("DATABASE_MAX_CONNECTIONS must be a valid u32");

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let cursor_strategy: CursorStrategy = std::env::var("SYNC_CURSOR_STRATEGY")
            .map(|v| v.parse().unwrap_or_else(|e| panic!("SYNC_CURSOR_STRATEGY: {e}")))
            .unwrap_or_default();

        let retention = match std::env::var("TOMBSTONE_RETENTION_DAYS") {
            Ok(days) => parse_retention_days(&days)
                .unwrap_or_else(|e| panic!("TOMBSTONE_RETENTION_DAYS: {e}")),
            Err(_) => RetentionPolicy::KEEP_FOREVER,
        };

        let tombstone_purge_interval_secs = parse_purge_interval_secs(
            &std::env::var("TOMBSTONE_PURGE_INTERVAL_SECS").unwrap_or_else(|_| "3600".into()),
        )
        .unwrap_or_else(|e| panic!("TOMBSTONE_PURGE_INTERVAL_SECS: {e}"));

        let log_format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("text") | Err(_) => LogFormat::Text,
            Ok(other) => panic!("LOG_FORMAT must be 'text' or 'json', got '{other}'"),
        };

        Self {
            database_url,
            database_max_connections,
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            sync: SyncConfig {
                cursor_strategy,
                retention,
            },
            tombstone_purge_interval_secs,
            log_format,
        }
    }
}

fn parse_retention_days(raw: &str) -> Result<RetentionPolicy, String> {
    let days: i64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a valid number of days"))?;
    RetentionPolicy::days(days).map_err(|e| e.to_string())
}

/// The purge ticker cannot run with a zero period.
fn parse_purge_interval_secs(raw: &str) -> Result<u64, String> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err("must be at least 1 second".into()),
        Ok(secs) => Ok(secs),
        Err(_) => Err(format!("'{raw}' is not a valid number of seconds")),
    }
}

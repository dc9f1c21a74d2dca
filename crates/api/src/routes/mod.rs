pub mod health;
pub mod sync;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /sync          POST   two-way sync (requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/sync", sync::router())
}

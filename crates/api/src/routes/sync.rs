use axum::routing::post;
use axum::Router;

use crate::handlers::sync;
use crate::state::AppState;

/// Sync routes mounted at `/sync`.
///
/// ```text
/// POST   /    -> synchronize
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(sync::synchronize))
}

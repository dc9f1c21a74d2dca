//! Handler for the two-way sync endpoint.

use axum::extract::State;
use axum::Json;
use notesync_sync::{SyncRequest, SyncResponse};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// POST /api/v1/sync
///
/// Applies the client's changes for the authenticated account and returns
/// everything changed since the client's cursor, plus the next cursor.
pub async fn synchronize(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> AppResult<Json<SyncResponse>> {
    let response = state.sync.synchronize(auth.account_id, request).await?;
    Ok(Json(response))
}

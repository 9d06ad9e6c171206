use axum::{Extension, Json, extract::State};

use aidlink_types::api::Claims;
use aidlink_types::models::RequestStats;

use crate::auth::AppState;
use crate::error::ApiError;

/// Recompute the dashboard counters and weekly histogram from the full
/// request set. On-demand only; the dashboard is not live-subscribed and
/// tolerates staleness between refreshes.
pub async fn stats(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<RequestStats>, ApiError> {
    let requests = state.db.list_requests()?;
    Ok(Json(aidlink_core::stats::compute(&requests)))
}

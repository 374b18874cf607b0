// Key statistics endpoint

use crate::api::routes::AppState;
use crate::db::store::KeyStats;
use crate::errors::Result;
use axum::{extract::State, Json};

/// GET /v1/stats (admin-authenticated)
pub async fn key_stats(State(state): State<AppState>) -> Result<Json<KeyStats>> {
    let stats = state.stats.key_stats().await?;
    Ok(Json(stats))
}

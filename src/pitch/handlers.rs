// src/pitch/handlers.rs

use axum::extract::{Extension, Json};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::PitchStats;
use super::services::PitchService;
use crate::common::{ApiError, AppState};

/// GET /api/pitch/stats (public)
pub async fn pitch_stats_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Json<PitchStats>, ApiError> {
    let state = state_lock.read().await.clone();
    Ok(Json(PitchService::new(state.db.clone()).stats().await?))
}

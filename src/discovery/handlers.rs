// src/discovery/handlers.rs

use axum::extract::{Extension, Json, Query};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::matching::{filter_and_rank, nearby};
use super::models::{NearbyQuery, RankedTutor, SearchFilters, DEFAULT_NEARBY_RADIUS_KM, MAX_LIMIT};
use super::services::DiscoveryService;
use crate::common::geo::Coordinates;
use crate::common::{ApiError, AppState};

/// GET /api/tutors - manual search
pub async fn search_tutors_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(filters): Query<SearchFilters>,
) -> Result<Json<Vec<RankedTutor>>, ApiError> {
    let state = state_lock.read().await.clone();

    if let Some(origin) = filters.origin() {
        if !origin.is_valid() {
            return Err(ApiError::BadRequest("Coordinates are out of range".to_string()));
        }
    }

    let candidates = DiscoveryService::new(state.db.clone()).load_candidates().await?;
    let total = candidates.len();
    let ranked = filter_and_rank(candidates, &filters);

    info!(
        candidates = total,
        results = ranked.len(),
        subject = ?filters.subject,
        area = ?filters.area,
        "Manual tutor search"
    );
    Ok(Json(ranked))
}

/// GET /api/tutors/nearby?lat&lng&radius_km
pub async fn nearby_tutors_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<RankedTutor>>, ApiError> {
    let state = state_lock.read().await.clone();

    let origin = Coordinates::new(query.lat, query.lng);
    if !origin.is_valid() {
        return Err(ApiError::BadRequest("Coordinates are out of range".to_string()));
    }
    let radius = query.radius_km.unwrap_or(DEFAULT_NEARBY_RADIUS_KM);
    if !(radius > 0.0 && radius <= 100.0) {
        return Err(ApiError::BadRequest(
            "radius_km must be between 0 and 100".to_string(),
        ));
    }

    let candidates = DiscoveryService::new(state.db.clone()).load_candidates().await?;
    let limit = query.limit.unwrap_or(MAX_LIMIT).clamp(1, MAX_LIMIT);
    Ok(Json(nearby(candidates, origin, radius, limit)))
}

// src/reviews/handlers.rs

use axum::extract::{Extension, Json, Path};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::{CreateReviewRequest, Reputation, Review};
use super::services::ReviewsService;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};

/// POST /api/reviews
pub async fn create_review_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    authed.require_member()?;
    let state = state_lock.read().await.clone();
    let review = ReviewsService::new(state.db.clone())
        .upsert_review(&authed.id, &request)
        .await?;
    Ok(Json(review))
}

/// GET /api/users/:id/reviews
pub async fn user_reviews_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let state = state_lock.read().await.clone();
    let reviews = ReviewsService::new(state.db.clone())
        .reviews_for(&user_id)
        .await?;
    Ok(Json(reviews))
}

/// GET /api/users/:id/reputation
pub async fn reputation_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Reputation>, ApiError> {
    let state = state_lock.read().await.clone();
    let reputation = ReviewsService::new(state.db.clone())
        .reputation(&user_id)
        .await?;
    Ok(Json(reputation))
}

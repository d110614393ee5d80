// src/shortener/handlers.rs

use axum::extract::{Extension, Json, Path};
use axum::http::StatusCode;
use axum::response::Redirect;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::*;
use super::services::ShortenerService;
use crate::auth::AuthedUser;
use crate::common::validation::Validator;
use crate::common::{ApiError, AppState};

/// POST /api/short-links
///
/// Signed-in callers become the owner; anyone else creates an unowned link.
pub async fn create_short_link_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: Option<AuthedUser>,
    Json(request): Json<CreateShortLinkRequest>,
) -> Result<(StatusCode, Json<ShortLinkResponse>), ApiError> {
    request.validate(&request).into_result()?;

    let state = state_lock.read().await.clone();
    let service = ShortenerService::new(state.db.clone(), &state.public_base_url);
    let response = service
        .create(&request, authed.as_ref().map(|a| a.id.as_str()))
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /s/:slug
pub async fn redirect_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(slug): Path<String>,
) -> Result<Redirect, ApiError> {
    let state = state_lock.read().await.clone();
    let target = ShortenerService::new(state.db.clone(), &state.public_base_url)
        .resolve(&slug)
        .await?;
    Ok(Redirect::temporary(&target))
}

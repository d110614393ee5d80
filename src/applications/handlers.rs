// src/applications/handlers.rs

use axum::extract::{Extension, Json, Path, Query};
use axum::http::StatusCode;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::*;
use super::services::ApplicationsService;
use crate::auth::AuthedUser;
use crate::common::validation::Validator;
use crate::common::{ApiError, AppState};

fn service(state: &AppState) -> ApplicationsService {
    ApplicationsService::new(state.db.clone(), state.appointment_events.clone())
}

/// POST /api/applications
pub async fn create_application_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<Application>), ApiError> {
    authed.require_member()?;
    request.validate(&request).into_result()?;

    let state = state_lock.read().await.clone();
    let application = service(&state).create(&authed, &request).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/applications?box=sent|received
pub async fn list_applications_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Query(query): Query<ApplicationsQuery>,
) -> Result<Json<Vec<Application>>, ApiError> {
    let state = state_lock.read().await.clone();
    Ok(Json(service(&state).list(&authed.id, query.mailbox).await?))
}

/// POST /api/applications/:id/accept
pub async fn accept_application_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<ApplicationDecision>, ApiError> {
    let state = state_lock.read().await.clone();
    Ok(Json(service(&state).respond(&id, &authed.id, true).await?))
}

/// POST /api/applications/:id/reject
pub async fn reject_application_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<ApplicationDecision>, ApiError> {
    let state = state_lock.read().await.clone();
    Ok(Json(service(&state).respond(&id, &authed.id, false).await?))
}

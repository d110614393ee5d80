// src/profiles/handlers.rs

use axum::extract::{Extension, Json, Path};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::models::*;
use super::services::ProfilesService;
use super::student_id::{parse_student_id, StudentIdInfo};
use crate::auth::{AuthedUser, Role};
use crate::common::{ApiError, AppState};
use crate::reviews::services::ReviewsService;

/// GET /api/profile
pub async fn get_profile_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = ProfilesService::new(state.db.clone());

    let profile = service.get_profile(&authed.id).await?;
    let details = match authed.role {
        Role::Tutor => serde_json::to_value(service.find_tutor_details(&authed.id).await?),
        Role::Student => serde_json::to_value(service.find_student_details(&authed.id).await?),
        Role::Stranger => Ok(serde_json::Value::Null),
    }
    .map_err(|e| ApiError::InternalServer(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "profile": profile,
        "details": details,
    })))
}

/// PUT /api/profile
pub async fn update_profile_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let state = state_lock.read().await.clone();
    info!(user_id = %authed.id, "Profile update request received");
    let profile = ProfilesService::new(state.db.clone())
        .update_profile(&authed.id, &request)
        .await?;
    Ok(Json(profile))
}

/// PUT /api/profile/presence
pub async fn presence_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<PresenceRequest>,
) -> Result<Json<Profile>, ApiError> {
    let state = state_lock.read().await.clone();
    let profile = ProfilesService::new(state.db.clone())
        .set_presence(&authed.id, request.is_online)
        .await?;
    Ok(Json(profile))
}

/// PUT /api/tutors/me
pub async fn upsert_tutor_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<UpsertTutorRequest>,
) -> Result<Json<TutorDetails>, ApiError> {
    authed.require_role(Role::Tutor)?;
    let state = state_lock.read().await.clone();
    let details = ProfilesService::new(state.db.clone())
        .upsert_tutor_details(&authed.id, &request)
        .await?;
    Ok(Json(details))
}

/// PUT /api/students/me
pub async fn upsert_student_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<UpsertStudentRequest>,
) -> Result<Json<StudentDetails>, ApiError> {
    authed.require_role(Role::Student)?;
    let state = state_lock.read().await.clone();
    let details = ProfilesService::new(state.db.clone())
        .upsert_student_details(&authed.id, &request)
        .await?;
    Ok(Json(details))
}

/// GET /api/tutors/:id - public tutor card
pub async fn tutor_card_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(tutor_id): Path<String>,
) -> Result<Json<TutorCard>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = ProfilesService::new(state.db.clone());

    let profile = service
        .find_profile(&tutor_id)
        .await?
        .filter(|p| p.role == Role::Tutor.as_str())
        .ok_or_else(|| ApiError::NotFound("Tutor not found".to_string()))?;
    let details = service
        .find_tutor_details(&tutor_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tutor not found".to_string()))?;
    let reputation = ReviewsService::new(state.db.clone())
        .reputation(&tutor_id)
        .await?;

    Ok(Json(TutorCard {
        profile,
        details,
        reputation,
    }))
}

/// POST /api/profile/varsity/code
pub async fn send_varsity_code_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<VarsityCodeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authed.require_role(Role::Tutor)?;
    let state = state_lock.read().await.clone();

    let code = ProfilesService::new(state.db.clone())
        .issue_varsity_code(&authed.id, &request.email)
        .await?;

    state
        .mailer
        .send_verification_code(&code.email, &code.code)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %authed.id, "Failed to deliver verification code");
            ApiError::ServiceUnavailable("Could not send the verification email".to_string())
        })?;

    Ok(Json(serde_json::json!({
        "message": "Verification code sent",
        "expires_at": code.expires_at,
    })))
}

/// POST /api/profile/varsity/verify
pub async fn verify_varsity_code_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<VarsityVerifyRequest>,
) -> Result<Json<TutorDetails>, ApiError> {
    authed.require_role(Role::Tutor)?;
    let state = state_lock.read().await.clone();
    let details = ProfilesService::new(state.db.clone())
        .verify_varsity_code(&authed.id, &request.code)
        .await?;
    Ok(Json(details))
}

/// POST /api/profile/student-id
pub async fn student_id_handler(
    _authed: AuthedUser,
    Json(request): Json<StudentIdRequest>,
) -> Result<Json<StudentIdInfo>, ApiError> {
    parse_student_id(&request.student_id)
        .map(Json)
        .ok_or_else(|| {
            ApiError::BadRequest("Student ID must look like YYSDDNNN (e.g. 21301245)".to_string())
        })
}

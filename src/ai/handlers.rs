// src/ai/handlers.rs

use axum::extract::{Extension, Json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::models::*;
use super::services::AiService;
use super::validators::{ChatValidator, RecommendationValidator, SearchValidator};
use crate::auth::AuthedUser;
use crate::common::validation::Validator;
use crate::common::{ApiError, AppState};

/// POST /api/ai-chat
pub async fn ai_chat_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<AiChatRequest>,
) -> Result<Json<AiChatResponse>, ApiError> {
    ChatValidator.validate(&request).into_result()?;
    let state = state_lock.read().await.clone();
    info!(user_id = %authed.id, turns = request.messages.len(), "AI chat request");
    Ok(Json(AiService::new(&state).chat(&request).await?))
}

/// POST /api/ai-recommendation
pub async fn ai_recommendation_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<MatchesResponse>, ApiError> {
    RecommendationValidator.validate(&request).into_result()?;
    let state = state_lock.read().await.clone();
    info!(
        user_id = %authed.id,
        has_location = request.latitude.is_some(),
        "AI recommendation request"
    );
    Ok(Json(AiService::new(&state).recommend(&request).await?))
}

/// POST /api/search
pub async fn search_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<SearchRequest>,
) -> Result<Json<MatchesResponse>, ApiError> {
    SearchValidator.validate(&request).into_result()?;
    let state = state_lock.read().await.clone();
    info!(user_id = %authed.id, "Free-text tutor search");
    Ok(Json(AiService::new(&state).search(&request).await?))
}

/// POST /api/identify-zone
pub async fn identify_zone_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _authed: AuthedUser,
    Json(request): Json<IdentifyZoneRequest>,
) -> Result<Json<IdentifyZoneResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    Ok(Json(AiService::new(&state).identify_zone(&request).await?))
}

/// POST /api/gemini-bio-generator
pub async fn bio_generator_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<BioRequest>,
) -> Result<Json<BioResponse>, ApiError> {
    request.validate(&request).into_result()?;
    let state = state_lock.read().await.clone();
    info!(user_id = %authed.id, "Bio generation request");
    Ok(Json(AiService::new(&state).generate_bio(&request).await?))
}

/// POST /api/analyze-id-card
pub async fn analyze_id_card_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<AnalyzeIdCardRequest>,
) -> Result<Json<IdCardResponse>, ApiError> {
    request.validate(&request).into_result()?;
    let state = state_lock.read().await.clone();
    info!(user_id = %authed.id, "ID card analysis request");
    Ok(Json(AiService::new(&state).analyze_id_card(&request).await?))
}

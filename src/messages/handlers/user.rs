// Direct messaging handlers

use crate::auth::extractors::AuthedUser;
use crate::common::error::ApiError;
use crate::common::state::AppState;
use crate::messages::models::{ConversationSummary, MarkReadResponse, Message, SendMessageRequest};
use crate::messages::services::MessageService;
use crate::messages::validators::validate_message_content;
use axum::{extract::Path, http::StatusCode, Extension, Json};
use std::sync::Arc;
use tokio::sync::RwLock;

/// POST /api/messages
pub async fn send_message(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(input): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    validate_message_content(&input.content)?;

    let state = state_lock.read().await.clone();
    let message = MessageService::new(state.db.clone())
        .create_message(&authed.id, input.receiver_id.trim(), &input.content)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /api/messages
pub async fn list_conversations(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    let state = state_lock.read().await.clone();
    let summaries = MessageService::new(state.db.clone())
        .list_conversations(&authed.id)
        .await?;
    Ok(Json(summaries))
}

/// GET /api/messages/:user_id
pub async fn get_conversation(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let state = state_lock.read().await.clone();
    let messages = MessageService::new(state.db.clone())
        .get_conversation(&authed.id, &user_id)
        .await?;
    Ok(Json(messages))
}

/// POST /api/messages/:user_id/read
pub async fn mark_conversation_read(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(user_id): Path<String>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let marked = MessageService::new(state.db.clone())
        .mark_conversation_read(&authed.id, &user_id)
        .await?;
    Ok(Json(MarkReadResponse { marked }))
}

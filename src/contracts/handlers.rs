// src/contracts/handlers.rs

use axum::extract::{Extension, Json, Path};
use axum::http::StatusCode;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::*;
use super::services::ContractsService;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};

async fn service(state_lock: &Arc<RwLock<AppState>>) -> ContractsService {
    ContractsService::new(state_lock.read().await.db.clone())
}

/// POST /api/contracts
pub async fn propose_contract_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<ProposeContractRequest>,
) -> Result<(StatusCode, Json<Contract>), ApiError> {
    authed.require_member()?;
    let contract = service(&state_lock).await.propose(&authed, &request).await?;
    Ok((StatusCode::CREATED, Json(contract)))
}

/// GET /api/contracts
pub async fn list_contracts_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Vec<Contract>>, ApiError> {
    Ok(Json(service(&state_lock).await.list_for_user(&authed.id).await?))
}

/// GET /api/contracts/:id
pub async fn get_contract_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<Contract>, ApiError> {
    Ok(Json(service(&state_lock).await.get(&id, &authed.id).await?))
}

/// POST /api/contracts/:id/counter
pub async fn counter_contract_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
    Json(request): Json<CounterOfferRequest>,
) -> Result<Json<Contract>, ApiError> {
    Ok(Json(
        service(&state_lock)
            .await
            .counter(&id, &authed.id, &request)
            .await?,
    ))
}

/// POST /api/contracts/:id/accept
pub async fn accept_contract_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<Contract>, ApiError> {
    Ok(Json(service(&state_lock).await.accept(&id, &authed.id).await?))
}

/// POST /api/contracts/:id/reject
pub async fn reject_contract_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<Contract>, ApiError> {
    Ok(Json(service(&state_lock).await.reject(&id, &authed.id).await?))
}

/// POST /api/contracts/:id/terminate
pub async fn terminate_contract_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<Contract>, ApiError> {
    Ok(Json(service(&state_lock).await.terminate(&id, &authed.id).await?))
}

// src/appointments/handlers.rs

use axum::extract::{Extension, Json, Path};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::models::*;
use super::qr::{render_svg, verification_uri};
use super::services::AppointmentsService;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};

fn service(state: &AppState) -> AppointmentsService {
    AppointmentsService::new(state.db.clone(), state.appointment_events.clone())
}

/// GET /api/appointments
pub async fn list_appointments_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let state = state_lock.read().await.clone();
    Ok(Json(service(&state).list_for_user(&authed.id).await?))
}

/// POST /api/appointments/:id/otp
pub async fn issue_otp_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<OtpResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let appointment = service(&state).issue_otp(&id, &authed.id).await?;

    let (otp, expires_at) = appointment
        .meeting_otp
        .zip(appointment.otp_expires_at)
        .ok_or_else(|| ApiError::InternalServer("Meeting code was not stored".to_string()))?;
    let qr_svg = render_svg(&verification_uri(&id, &otp))?;

    Ok(Json(OtpResponse {
        otp,
        expires_at,
        qr_svg,
    }))
}

/// GET /api/appointments/:id/qr
pub async fn qr_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<QrResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let (otp, expires_at) = service(&state).current_otp(&id, &authed.id).await?;
    Ok(Json(QrResponse {
        qr_svg: render_svg(&verification_uri(&id, &otp))?,
        expires_at,
    }))
}

/// POST /api/appointments/:id/verify
pub async fn verify_otp_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<Appointment>, ApiError> {
    let state = state_lock.read().await.clone();
    let appointment = service(&state)
        .verify_otp(&id, &authed.id, &request.otp)
        .await?;
    Ok(Json(appointment.for_viewer(&authed.id)))
}

/// POST /api/appointments/:id/complete
pub async fn complete_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    let state = state_lock.read().await.clone();
    let appointment = service(&state).complete(&id, &authed.id).await?;
    Ok(Json(appointment.for_viewer(&authed.id)))
}

/// POST /api/appointments/:id/cancel
pub async fn cancel_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    let state = state_lock.read().await.clone();
    let appointment = service(&state).cancel(&id, &authed.id).await?;
    Ok(Json(appointment.for_viewer(&authed.id)))
}

/// PUT /api/appointments/:id/payment
pub async fn payment_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<Appointment>, ApiError> {
    let state = state_lock.read().await.clone();
    let appointment = service(&state)
        .set_payment_status(&id, &authed.id, request.payment_status.trim())
        .await?;
    Ok(Json(appointment.for_viewer(&authed.id)))
}

/// GET /api/appointments/events - SSE feed of the caller's appointment changes
///
/// Payloads only say what changed; clients re-fetch the appointment list.
pub async fn appointment_events_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state_lock.read().await.appointment_events.subscribe();
    debug!(user_id = %authed.id, "Appointment event subscriber connected");

    let stream = stream::unfold(
        (receiver, authed.id),
        |(mut receiver, user_id)| async move {
            loop {
                match receiver.recv().await {
                    Ok(event) if event.involves(&user_id) => {
                        let data = serde_json::to_string(&event).unwrap_or_default();
                        let event = Event::default().event("appointment").data(data);
                        return Some((Ok(event), (receiver, user_id)));
                    }
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(user_id = %user_id, skipped, "Appointment subscriber lagged");
                        let event = Event::default().event("resync").data("{}");
                        return Some((Ok(event), (receiver, user_id)));
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        },
    );

    Sse::new(stream).keep_alive(KeepAlive::default())
}

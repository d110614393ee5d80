// src/appointments/tests.rs

#[cfg(test)]
mod tests {
    use super::super::models::*;
    use super::super::services::AppointmentsService;
    use super::super::*;
    use crate::applications::models::CreateApplicationRequest;
    use crate::applications::services::ApplicationsService;
    use crate::auth::models::User;
    use crate::common::test_support::{authed, bearer, create_user, send, test_state, with_state};
    use crate::common::{ApiError, AppState};
    use axum::http::StatusCode;
    use serde_json::json;

    struct Meeting {
        student: User,
        tutor: User,
        appointment: Appointment,
    }

    async fn scheduled_meeting(state: &AppState, prefix: &str) -> Meeting {
        let student = create_user(state, &format!("{}_student", prefix), "student").await;
        let tutor = create_user(state, &format!("{}_tutor", prefix), "tutor").await;
        let applications =
            ApplicationsService::new(state.db.clone(), state.appointment_events.clone());
        let application = applications
            .create(
                &authed(&student),
                &CreateApplicationRequest {
                    receiver_id: tutor.id.clone(),
                    message: "Math for class 8".to_string(),
                },
            )
            .await
            .unwrap();
        let decision = applications
            .respond(&application.id, &tutor.id, true)
            .await
            .unwrap();
        Meeting {
            student,
            tutor,
            appointment: decision.appointment.unwrap(),
        }
    }

    fn service(state: &AppState) -> AppointmentsService {
        AppointmentsService::new(state.db.clone(), state.appointment_events.clone())
    }

    #[tokio::test]
    async fn test_concurrent_cancel_applies_once() {
        let state = test_state().await;
        let meeting = scheduled_meeting(&state, "race").await;
        let mut events = state.appointment_events.subscribe();
        let first = service(&state);
        let second = service(&state);
        let id = &meeting.appointment.id;

        let (a, b) = tokio::join!(
            first.cancel(id, &meeting.student.id),
            second.cancel(id, &meeting.tutor.id)
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert!(matches!(
            a.err().or(b.err()),
            Some(ApiError::Conflict(_)) | Some(ApiError::BadRequest(_))
        ));

        let mut published = Vec::new();
        while let Ok(event) = events.try_recv() {
            published.push(event);
        }
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].status, STATUS_CANCELLED);
    }

    #[tokio::test]
    async fn test_otp_is_single_use() {
        let state = test_state().await;
        let meeting = scheduled_meeting(&state, "single").await;
        let service = service(&state);
        let id = &meeting.appointment.id;

        assert!(matches!(
            service.issue_otp(id, &meeting.tutor.id).await,
            Err(ApiError::Forbidden(_))
        ));
        let issued = service.issue_otp(id, &meeting.student.id).await.unwrap();
        let otp = issued.meeting_otp.unwrap();
        assert_eq!(otp.len(), OTP_LENGTH);

        assert!(matches!(
            service.verify_otp(id, &meeting.student.id, &otp).await,
            Err(ApiError::Forbidden(_))
        ));
        let wrong = if otp == "000000" { "111111" } else { "000000" };
        assert!(matches!(
            service.verify_otp(id, &meeting.tutor.id, wrong).await,
            Err(ApiError::BadRequest(_))
        ));

        let verified = service.verify_otp(id, &meeting.tutor.id, &otp).await.unwrap();
        assert_eq!(verified.status, STATUS_VERIFIED);
        assert_eq!(verified.session_status, SESSION_IN_PROGRESS);
        assert!(verified.is_verified_onsite);
        assert_eq!(verified.meeting_otp, None);

        assert!(matches!(
            service.verify_otp(id, &meeting.tutor.id, &otp).await,
            Err(ApiError::BadRequest(_))
        ));

        let completed = service.complete(id, &meeting.student.id).await.unwrap();
        assert_eq!(completed.status, STATUS_COMPLETED);
        assert_eq!(completed.session_status, SESSION_ENDED);
    }

    #[tokio::test]
    async fn test_expired_otp_is_rejected() {
        let state = test_state().await;
        let meeting = scheduled_meeting(&state, "expiry").await;
        let service = service(&state);
        let id = &meeting.appointment.id;

        let otp = service
            .issue_otp(id, &meeting.student.id)
            .await
            .unwrap()
            .meeting_otp
            .unwrap();
        sqlx::query("UPDATE appointments SET otp_expires_at = ? WHERE id = ?")
            .bind((chrono::Utc::now() - chrono::Duration::minutes(1)).to_rfc3339())
            .bind(id)
            .execute(&state.db)
            .await
            .unwrap();

        assert!(matches!(
            service.verify_otp(id, &meeting.tutor.id, &otp).await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            service.current_otp(id, &meeting.student.id).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_and_payment_rules() {
        let state = test_state().await;
        let meeting = scheduled_meeting(&state, "pay").await;
        let service = service(&state);
        let id = &meeting.appointment.id;

        assert!(matches!(
            service.set_payment_status(id, &meeting.tutor.id, PAYMENT_PENDING).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            service.set_payment_status(id, &meeting.student.id, PAYMENT_PAID).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            service.set_payment_status(id, &meeting.student.id, "refunded").await,
            Err(ApiError::BadRequest(_))
        ));
        let pending = service
            .set_payment_status(id, &meeting.student.id, PAYMENT_PENDING)
            .await
            .unwrap();
        assert_eq!(pending.payment_status, PAYMENT_PENDING);
        let paid = service
            .set_payment_status(id, &meeting.tutor.id, PAYMENT_PAID)
            .await
            .unwrap();
        assert_eq!(paid.payment_status, PAYMENT_PAID);

        assert!(matches!(
            service.complete(id, &meeting.tutor.id).await,
            Err(ApiError::BadRequest(_))
        ));
        let cancelled = service.cancel(id, &meeting.tutor.id).await.unwrap();
        assert_eq!(cancelled.status, STATUS_CANCELLED);
        assert!(matches!(
            service.cancel(id, &meeting.tutor.id).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_events_reach_subscribers() {
        let state = test_state().await;
        let meeting = scheduled_meeting(&state, "events").await;
        let mut receiver = state.appointment_events.subscribe();

        service(&state)
            .cancel(&meeting.appointment.id, &meeting.student.id)
            .await
            .unwrap();

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.appointment_id, meeting.appointment.id);
        assert_eq!(event.status, STATUS_CANCELLED);
        assert!(event.involves(&meeting.tutor.id));
        assert!(!event.involves("U_SOMEONE_ELSE"));

        let payload = serde_json::to_value(&event).unwrap();
        assert!(payload.get("student_id").is_none());
    }

    #[tokio::test]
    async fn test_http_otp_hidden_from_tutor() {
        let state = test_state().await;
        let meeting = scheduled_meeting(&state, "http").await;
        let student_auth = bearer(&state, &meeting.student);
        let tutor_auth = bearer(&state, &meeting.tutor);
        let id = meeting.appointment.id.clone();
        let router = with_state(appointments_routes(), state);

        let (status, issued) = send(
            router.clone(),
            "POST",
            &format!("/api/appointments/{}/otp", id),
            Some(&student_auth),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(issued["qr_svg"].as_str().unwrap().contains("<svg"));
        let otp = issued["otp"].as_str().unwrap().to_string();

        let (_, student_view) = send(router.clone(), "GET", "/api/appointments", Some(&student_auth), None).await;
        assert_eq!(student_view[0]["meeting_otp"], otp.as_str());
        let (_, tutor_view) = send(router.clone(), "GET", "/api/appointments", Some(&tutor_auth), None).await;
        assert!(tutor_view[0]["meeting_otp"].is_null());

        let (status, _) = send(
            router.clone(),
            "GET",
            &format!("/api/appointments/{}/qr", id),
            Some(&tutor_auth),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, verified) = send(
            router,
            "POST",
            &format!("/api/appointments/{}/verify", id),
            Some(&tutor_auth),
            Some(json!({"otp": otp})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(verified["status"], "verified");
    }
}

// src/contracts/tests.rs

#[cfg(test)]
mod tests {
    use super::super::models::*;
    use super::super::services::ContractsService;
    use super::super::*;
    use crate::applications::models::CreateApplicationRequest;
    use crate::applications::services::ApplicationsService;
    use crate::auth::models::User;
    use crate::common::test_support::{authed, bearer, create_user, send, test_state, with_state};
    use crate::common::{ApiError, AppState};
    use axum::http::StatusCode;
    use serde_json::json;

    async fn matched_pair(state: &AppState, prefix: &str) -> (User, User) {
        let student = create_user(state, &format!("{}_student", prefix), "student").await;
        let tutor = create_user(state, &format!("{}_tutor", prefix), "tutor").await;
        let applications =
            ApplicationsService::new(state.db.clone(), state.appointment_events.clone());
        let application = applications
            .create(
                &authed(&student),
                &CreateApplicationRequest {
                    receiver_id: tutor.id.clone(),
                    message: "Chemistry twice a week".to_string(),
                },
            )
            .await
            .unwrap();
        applications.respond(&application.id, &tutor.id, true).await.unwrap();
        (student, tutor)
    }

    fn proposal(counterparty_id: &str, fee: i64) -> ProposeContractRequest {
        ProposeContractRequest {
            counterparty_id: counterparty_id.to_string(),
            monthly_fee: fee,
            days_per_week: 3,
            subjects: vec!["Chemistry".to_string()],
        }
    }

    #[tokio::test]
    async fn test_proposal_requires_accepted_application() {
        let state = test_state().await;
        let student = create_user(&state, "cold_student", "student").await;
        let tutor = create_user(&state, "cold_tutor", "tutor").await;

        let result = ContractsService::new(state.db.clone())
            .propose(&authed(&student), &proposal(&tutor.id, 6000))
            .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_concurrent_proposals_leave_one_open_contract() {
        let state = test_state().await;
        let (student, tutor) = matched_pair(&state, "race").await;
        let first = ContractsService::new(state.db.clone());
        let second = ContractsService::new(state.db.clone());
        let actor = authed(&student);
        let terms = proposal(&tutor.id, 6000);

        let (a, b) = tokio::join!(first.propose(&actor, &terms), second.propose(&actor, &terms));
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert!(matches!(a.err().or(b.err()), Some(ApiError::Conflict(_))));

        let open: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM contracts WHERE student_id = ? AND tutor_id = ? AND status IN ('pending', 'active')",
        )
        .bind(&student.id)
        .bind(&tutor.id)
        .fetch_one(&state.db)
        .await
        .unwrap();
        assert_eq!(open, 1);
    }

    #[tokio::test]
    async fn test_negotiation_turns() {
        let state = test_state().await;
        let (student, tutor) = matched_pair(&state, "nego").await;
        let service = ContractsService::new(state.db.clone());

        let contract = service.propose(&authed(&student), &proposal(&tutor.id, 5000)).await.unwrap();
        assert_eq!(contract.status, STATUS_PENDING);
        assert_eq!(contract.last_action_by, student.id);

        // proposer can neither accept nor counter their own offer
        assert!(matches!(
            service.accept(&contract.id, &student.id).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            service
                .counter(&contract.id, &student.id, &CounterOfferRequest { monthly_fee: Some(5500), ..Default::default() })
                .await,
            Err(ApiError::Forbidden(_))
        ));

        let countered = service
            .counter(&contract.id, &tutor.id, &CounterOfferRequest { monthly_fee: Some(7000), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(countered.monthly_fee, 7000);
        assert_eq!(countered.days_per_week, 3);
        assert_eq!(countered.last_action_by, tutor.id);

        assert!(matches!(
            service.accept(&contract.id, &tutor.id).await,
            Err(ApiError::Forbidden(_))
        ));
        let active = service.accept(&contract.id, &student.id).await.unwrap();
        assert_eq!(active.status, STATUS_ACTIVE);

        // one open contract per pair
        assert!(matches!(
            service.propose(&authed(&tutor), &proposal(&student.id, 6000)).await,
            Err(ApiError::Conflict(_))
        ));

        let terminated = service.terminate(&contract.id, &tutor.id).await.unwrap();
        assert_eq!(terminated.status, STATUS_TERMINATED);
        assert!(service.propose(&authed(&tutor), &proposal(&student.id, 6000)).await.is_ok());
    }

    #[tokio::test]
    async fn test_reject_and_invalid_counter() {
        let state = test_state().await;
        let (student, tutor) = matched_pair(&state, "rej").await;
        let service = ContractsService::new(state.db.clone());

        assert!(matches!(
            service.propose(&authed(&tutor), &proposal(&student.id, 100)).await,
            Err(ApiError::ValidationError(_))
        ));

        let contract = service.propose(&authed(&tutor), &proposal(&student.id, 8000)).await.unwrap();
        assert!(matches!(
            service
                .counter(&contract.id, &student.id, &CounterOfferRequest { days_per_week: Some(9), ..Default::default() })
                .await,
            Err(ApiError::ValidationError(_))
        ));
        assert!(matches!(
            service.counter(&contract.id, &student.id, &CounterOfferRequest::default()).await,
            Err(ApiError::BadRequest(_))
        ));

        let rejected = service.reject(&contract.id, &student.id).await.unwrap();
        assert_eq!(rejected.status, STATUS_REJECTED);
        assert!(matches!(
            service.terminate(&contract.id, &student.id).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_http_participants_only() {
        let state = test_state().await;
        let (student, tutor) = matched_pair(&state, "http").await;
        let outsider = create_user(&state, "http_outsider", "student").await;
        let student_auth = bearer(&state, &student);
        let outsider_auth = bearer(&state, &outsider);
        let router = with_state(contracts_routes(), state);

        let (status, created) = send(
            router.clone(),
            "POST",
            "/api/contracts",
            Some(&student_auth),
            Some(json!({"counterparty_id": tutor.id, "monthly_fee": 6000, "days_per_week": 4, "subjects": ["Math", "Physics"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["subjects"], json!(["Math", "Physics"]));

        let uri = format!("/api/contracts/{}", created["id"].as_str().unwrap());
        let (status, _) = send(router.clone(), "GET", &uri, Some(&outsider_auth), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, list) = send(router, "GET", "/api/contracts", Some(&student_auth), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }
}

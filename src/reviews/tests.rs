// src/reviews/tests.rs

#[cfg(test)]
mod tests {
    use super::super::models::CreateReviewRequest;
    use super::super::services::ReviewsService;
    use super::super::*;
    use crate::common::test_support::{bearer, create_user, send, test_state, with_state};
    use crate::common::{ApiError, AppState};
    use axum::http::StatusCode;

    async fn insert_contract(state: &AppState, student_id: &str, tutor_id: &str, status: &str) {
        sqlx::query(
            r#"
            INSERT INTO contracts (id, student_id, tutor_id, monthly_fee, days_per_week, subjects,
                                   status, last_action_by, created_at, updated_at)
            VALUES (?, ?, ?, 6000, 3, '["Physics"]', ?, ?, 'now', 'now')
            "#,
        )
        .bind(crate::common::generate_contract_id())
        .bind(student_id)
        .bind(tutor_id)
        .bind(status)
        .bind(student_id)
        .execute(&state.db)
        .await
        .unwrap();
    }

    fn review(reviewee_id: &str, rating: i64, is_strike: bool) -> CreateReviewRequest {
        CreateReviewRequest {
            reviewee_id: reviewee_id.to_string(),
            rating,
            comment: Some("Explains clearly".to_string()),
            is_strike,
        }
    }

    #[tokio::test]
    async fn test_review_requires_shared_contract() {
        let state = test_state().await;
        let student = create_user(&state, "rev_student", "student").await;
        let tutor = create_user(&state, "rev_tutor", "tutor").await;
        let service = ReviewsService::new(state.db.clone());

        let result = service.upsert_review(&student.id, &review(&tutor.id, 5, false)).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));

        // a pending contract is not enough
        insert_contract(&state, &student.id, &tutor.id, "pending").await;
        let result = service.upsert_review(&student.id, &review(&tutor.id, 5, false)).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));

        insert_contract(&state, &student.id, &tutor.id, "terminated").await;
        let saved = service
            .upsert_review(&student.id, &review(&tutor.id, 5, false))
            .await
            .unwrap();
        assert_eq!(saved.rating, 5);
    }

    #[tokio::test]
    async fn test_review_validation_and_self_review() {
        let state = test_state().await;
        let student = create_user(&state, "self_student", "student").await;
        let service = ReviewsService::new(state.db.clone());

        assert!(matches!(
            service.upsert_review(&student.id, &review(&student.id, 6, false)).await,
            Err(ApiError::ValidationError(_))
        ));
        assert!(matches!(
            service.upsert_review(&student.id, &review(&student.id, 4, false)).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_reposting_replaces_and_reputation_aggregates() {
        let state = test_state().await;
        let tutor = create_user(&state, "agg_tutor", "tutor").await;
        let first = create_user(&state, "agg_student1", "student").await;
        let second = create_user(&state, "agg_student2", "student").await;
        insert_contract(&state, &first.id, &tutor.id, "active").await;
        insert_contract(&state, &second.id, &tutor.id, "terminated").await;
        let service = ReviewsService::new(state.db.clone());

        assert_eq!(service.reputation(&tutor.id).await.unwrap(), Default::default());

        service.upsert_review(&first.id, &review(&tutor.id, 2, false)).await.unwrap();
        service.upsert_review(&first.id, &review(&tutor.id, 5, false)).await.unwrap();
        service.upsert_review(&second.id, &review(&tutor.id, 4, true)).await.unwrap();

        let reputation = service.reputation(&tutor.id).await.unwrap();
        assert_eq!(reputation.review_count, 2);
        assert_eq!(reputation.average_rating, 4.5);
        assert_eq!(reputation.strike_count, 1);
        assert_eq!(service.reviews_for(&tutor.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_average_rounded_to_two_places() {
        let state = test_state().await;
        let tutor = create_user(&state, "round_tutor", "tutor").await;
        let service = ReviewsService::new(state.db.clone());
        for (i, rating) in [5, 4, 4].into_iter().enumerate() {
            let student = create_user(&state, &format!("round_s{}", i), "student").await;
            insert_contract(&state, &student.id, &tutor.id, "active").await;
            service.upsert_review(&student.id, &review(&tutor.id, rating, false)).await.unwrap();
        }
        assert_eq!(service.reputation(&tutor.id).await.unwrap().average_rating, 4.33);
    }

    #[tokio::test]
    async fn test_guest_cannot_review_over_http() {
        let state = test_state().await;
        let guest = crate::auth::services::AuthService::new(state.db.clone())
            .guest(None)
            .await
            .unwrap();
        let token = bearer(&state, &guest);
        let router = with_state(reviews_routes(), state);

        let (status, _) = send(
            router.clone(),
            "POST",
            "/api/reviews",
            Some(&token),
            Some(serde_json::json!({"reviewee_id": "U_X", "rating": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(router, "GET", "/api/users/U_X/reputation", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["review_count"], 0);
    }
}

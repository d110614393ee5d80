// src/profiles/tests.rs

#[cfg(test)]
mod tests {
    use super::super::models::*;
    use super::super::services::ProfilesService;
    use super::super::*;
    use crate::common::test_support::{bearer, create_user, send, test_state, with_state};
    use crate::common::ApiError;
    use axum::http::StatusCode;

    fn tutor_request() -> UpsertTutorRequest {
        UpsertTutorRequest {
            basic_info: Some(BasicInfo {
                full_name: Some("Rahim Uddin".to_string()),
                gender: Some("male".to_string()),
                ..Default::default()
            }),
            teaching_details: Some(TeachingDetails {
                subjects: vec!["Physics".to_string(), "Math".to_string()],
                classes: vec!["HSC".to_string()],
                preferred_areas: vec!["Mirpur".to_string()],
                salary_min: Some(5000),
                salary_max: Some(9000),
                ..Default::default()
            }),
            varsity_infos: Some(vec![VarsityInfo {
                university: "BRAC University".to_string(),
                ..Default::default()
            }]),
            bio: Some("Patient physics tutor".to_string()),
        }
    }

    #[tokio::test]
    async fn test_update_profile_mirrors_location_into_details() {
        let state = test_state().await;
        let tutor = create_user(&state, "mirror_tutor", "tutor").await;
        let service = ProfilesService::new(state.db.clone());

        let profile = service
            .update_profile(
                &tutor.id,
                &UpdateProfileRequest {
                    primary_area: Some(" Dhanmondi ".to_string()),
                    latitude: Some(23.7461),
                    longitude: Some(90.3742),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(profile.primary_area.as_deref(), Some("Dhanmondi"));

        let details = service.find_tutor_details(&tutor.id).await.unwrap().unwrap();
        assert_eq!(details.primary_area.as_deref(), Some("Dhanmondi"));
        assert_eq!(details.latitude, Some(23.7461));
    }

    #[tokio::test]
    async fn test_username_must_be_unique() {
        let state = test_state().await;
        create_user(&state, "taken_name", "student").await;
        let other = create_user(&state, "other_name", "student").await;

        let result = ProfilesService::new(state.db.clone())
            .update_profile(
                &other.id,
                &UpdateProfileRequest {
                    username: Some("taken_name".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_upsert_tutor_details_keeps_unsent_fields() {
        let state = test_state().await;
        let tutor = create_user(&state, "upsert_tutor", "tutor").await;
        let service = ProfilesService::new(state.db.clone());

        service.upsert_tutor_details(&tutor.id, &tutor_request()).await.unwrap();
        let updated = service
            .upsert_tutor_details(
                &tutor.id,
                &UpsertTutorRequest {
                    bio: Some("Now also teaching chemistry".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.bio.as_deref(), Some("Now also teaching chemistry"));
        assert_eq!(updated.teaching_details.subjects, vec!["Physics", "Math"]);
        assert_eq!(updated.varsity_infos.len(), 1);
        assert!(!updated.varsity_verified);
    }

    #[tokio::test]
    async fn test_malformed_json_column_degrades_to_default() {
        let state = test_state().await;
        let tutor = create_user(&state, "broken_json", "tutor").await;
        sqlx::query("UPDATE tutors SET teaching_details = '{oops' WHERE id = ?")
            .bind(&tutor.id)
            .execute(&state.db)
            .await
            .unwrap();

        let details = ProfilesService::new(state.db.clone())
            .find_tutor_details(&tutor.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(details.teaching_details, TeachingDetails::default());
    }

    #[tokio::test]
    async fn test_varsity_code_flow() {
        let state = test_state().await;
        let tutor = create_user(&state, "varsity_tutor", "tutor").await;
        let service = ProfilesService::new(state.db.clone());

        assert!(matches!(
            service.issue_varsity_code(&tutor.id, "rahim@gmail.com").await,
            Err(ApiError::BadRequest(_))
        ));

        let old = service
            .issue_varsity_code(&tutor.id, "rahim@g.bracu.ac.bd")
            .await
            .unwrap();
        let code = service
            .issue_varsity_code(&tutor.id, "rahim@g.bracu.ac.bd")
            .await
            .unwrap();
        assert_eq!(code.code.len(), 6);

        let (rows,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM verification_codes WHERE user_id = ?")
                .bind(&tutor.id)
                .fetch_one(&state.db)
                .await
                .unwrap();
        assert_eq!(rows, 1);

        let wrong = if code.code == "000000" { "111111" } else { "000000" };
        assert!(service.verify_varsity_code(&tutor.id, wrong).await.is_err());
        if old.code != code.code {
            assert!(service.verify_varsity_code(&tutor.id, &old.code).await.is_err());
        }

        let details = service.verify_varsity_code(&tutor.id, &code.code).await.unwrap();
        assert!(details.varsity_verified);

        // single use
        assert!(service.verify_varsity_code(&tutor.id, &code.code).await.is_err());
    }

    #[tokio::test]
    async fn test_expired_varsity_code_rejected() {
        let state = test_state().await;
        let tutor = create_user(&state, "expired_tutor", "tutor").await;
        let service = ProfilesService::new(state.db.clone());

        let code = service
            .issue_varsity_code(&tutor.id, "expired@du.ac.bd")
            .await
            .unwrap();
        sqlx::query("UPDATE verification_codes SET expires_at = '2020-01-01T00:00:00+00:00'")
            .execute(&state.db)
            .await
            .unwrap();

        assert!(matches!(
            service.verify_varsity_code(&tutor.id, &code.code).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_role_gated_detail_routes() {
        let state = test_state().await;
        let student = create_user(&state, "gate_student", "student").await;
        let token = bearer(&state, &student);
        let router = with_state(profiles_routes(), state);

        let (status, _) = send(
            router.clone(),
            "PUT",
            "/api/tutors/me",
            Some(&token),
            Some(serde_json::json!({"bio": "not a tutor"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            router,
            "PUT",
            "/api/students/me",
            Some(&token),
            Some(serde_json::json!({"teaching_details": {"subjects": ["Chemistry"], "classes": ["Class 9"]}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["teaching_details"]["subjects"][0], "Chemistry");
    }

    #[tokio::test]
    async fn test_public_tutor_card_and_student_id() {
        let state = test_state().await;
        let tutor = create_user(&state, "card_tutor", "tutor").await;
        let student = create_user(&state, "card_student", "student").await;
        ProfilesService::new(state.db.clone())
            .upsert_tutor_details(&tutor.id, &tutor_request())
            .await
            .unwrap();
        let token = bearer(&state, &student);
        let router = with_state(profiles_routes(), state);

        let (status, card) = send(router.clone(), "GET", &format!("/api/tutors/{}", tutor.id), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(card["profile"]["username"], "card_tutor");
        assert_eq!(card["details"]["basic_info"]["full_name"], "Rahim Uddin");
        assert_eq!(card["reputation"]["review_count"], 0);

        let (status, _) = send(router.clone(), "GET", &format!("/api/tutors/{}", student.id), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, parsed) = send(
            router.clone(),
            "POST",
            "/api/profile/student-id",
            Some(&token),
            Some(serde_json::json!({"student_id": "21-3-01-245"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parsed["admission_year"], 2021);
        assert_eq!(parsed["semester"], "fall");

        let (status, _) = send(
            router,
            "POST",
            "/api/profile/student-id",
            Some(&token),
            Some(serde_json::json!({"student_id": "abc"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

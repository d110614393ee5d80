#[cfg(test)]
mod tests {
    use crate::auth::services::AuthService;
    use crate::common::test_support::{create_user, send, test_state, with_state};
    use crate::pitch::models::AreaCount;
    use crate::pitch::pitch_routes;
    use crate::pitch::services::PitchService;
    use crate::profiles::models::UpdateProfileRequest;
    use crate::profiles::services::ProfilesService;
    use axum::http::StatusCode;

    async fn set_area(profiles: &ProfilesService, user_id: &str, area: &str) {
        profiles
            .update_profile(
                user_id,
                &UpdateProfileRequest {
                    primary_area: Some(area.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_stats_counts() {
        let state = test_state().await;
        let t1 = create_user(&state, "pitch_t1", "tutor").await;
        let t2 = create_user(&state, "pitch_t2", "tutor").await;
        let t3 = create_user(&state, "pitch_t3", "tutor").await;
        create_user(&state, "pitch_s1", "student").await;

        let profiles = ProfilesService::new(state.db.clone());
        set_area(&profiles, &t1.id, "Mirpur").await;
        set_area(&profiles, &t2.id, "Mirpur").await;
        set_area(&profiles, &t3.id, "Dhanmondi").await;

        sqlx::query("UPDATE tutors SET varsity_verified = 1 WHERE id = ?")
            .bind(&t1.id)
            .execute(&state.db)
            .await
            .unwrap();

        let stats = PitchService::new(state.db.clone()).stats().await.unwrap();
        assert_eq!(stats.tutors, 3);
        assert_eq!(stats.students, 1);
        assert_eq!(stats.verified_tutors, 1);
        assert_eq!(stats.active_contracts, 0);
        assert_eq!(
            stats.areas,
            vec![
                AreaCount { area: "Mirpur".to_string(), tutors: 2 },
                AreaCount { area: "Dhanmondi".to_string(), tutors: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_guests_are_not_counted() {
        let state = test_state().await;
        AuthService::new(state.db.clone())
            .guest(None)
            .await
            .unwrap();

        let app = with_state(pitch_routes(), state);
        let (status, body) = send(app, "GET", "/api/pitch/stats", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tutors"], 0);
        assert_eq!(body["students"], 0);
        assert!(body["areas"].as_array().unwrap().is_empty());
    }
}

//! Tests for auth module
//!
//! Covers token handling, credential validation, the guest lifecycle and
//! the HTTP surface.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::common::test_support::{bearer, create_user, send, test_state, with_state};
    use crate::common::{ApiError, Validator};
    use axum::http::StatusCode;
    use models::{RegisterRequest, UpgradeRequest};
    use services::{decode_token, issue_token, AuthService};

    fn register_request(email: &str, username: &str, role: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "correct-horse".to_string(),
            role: role.to_string(),
            username: username.to_string(),
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Tutor".parse::<Role>().unwrap(), Role::Tutor);
        assert_eq!("guest".parse::<Role>().unwrap(), Role::Stranger);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::Student.counterpart(), Some(Role::Tutor));
        assert_eq!(Role::Stranger.counterpart(), None);
    }

    #[test]
    fn test_register_validation() {
        let bad = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            role: "stranger".to_string(),
            username: "x".to_string(),
        };
        let result = bad.validate(&bad);
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "password", "role", "username"]);

        let good = register_request("nadia@bracu.ac.bd", "nadia.k", "student");
        assert!(good.validate(&good).is_valid);
    }

    #[test]
    fn test_username_rules() {
        assert!(validators::is_valid_username("rahim_01"));
        assert!(!validators::is_valid_username("ra"));
        assert!(!validators::is_valid_username("has space"));
        assert!(!validators::is_valid_username(&"a".repeat(33)));
    }

    #[tokio::test]
    async fn test_token_roundtrip_and_wrong_secret() {
        let state = test_state().await;
        let user = create_user(&state, "karim", "tutor").await;

        let token = issue_token(&user, "test_secret_key", 1).unwrap();
        let claims = decode_token(&token, "test_secret_key").unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, "tutor");

        assert!(matches!(
            decode_token(&token, "wrong_secret_key"),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_register_creates_profile_and_details_rows() {
        let state = test_state().await;
        let user = create_user(&state, "tutor_one", "tutor").await;

        let (username,): (String,) = sqlx::query_as("SELECT username FROM profiles WHERE id = ?")
            .bind(&user.id)
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert_eq!(username, "tutor_one");

        let tutors: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tutors WHERE id = ?")
            .bind(&user.id)
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert_eq!(tutors.0, 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_and_username_conflict() {
        let state = test_state().await;
        let service = AuthService::new(state.db.clone());
        service
            .register(&register_request("dup@example.com", "first_user", "student"))
            .await
            .unwrap();

        let same_email = service
            .register(&register_request("DUP@example.com", "second_user", "student"))
            .await;
        assert!(matches!(same_email, Err(ApiError::Conflict(_))));

        let same_username = service
            .register(&register_request("other@example.com", "first_user", "tutor"))
            .await;
        assert!(matches!(same_username, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_login_checks_password() {
        let state = test_state().await;
        let service = AuthService::new(state.db.clone());
        let user = create_user(&state, "login_user", "student").await;

        let ok = service
            .login("Login_User@example.com", "correct-horse")
            .await
            .unwrap();
        assert_eq!(ok.id, user.id);

        assert!(matches!(
            service.login("login_user@example.com", "wrong-horse").await,
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            service.login("nobody@example.com", "correct-horse").await,
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_guest_reuses_fingerprint_and_upgrades() {
        let state = test_state().await;
        let service = AuthService::new(state.db.clone());

        let first = service.guest(Some("device-abc")).await.unwrap();
        let second = service.guest(Some("device-abc")).await.unwrap();
        let other = service.guest(None).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_ne!(first.id, other.id);
        assert_eq!(first.role(), Role::Stranger);
        assert!(first.is_anonymous);

        let upgraded = service
            .upgrade(
                &first.id,
                &UpgradeRequest {
                    email: "converted@example.com".to_string(),
                    password: "correct-horse".to_string(),
                    role: "tutor".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(upgraded.id, first.id);
        assert_eq!(upgraded.role(), Role::Tutor);
        assert!(!upgraded.is_anonymous);

        // a full account cannot be upgraded again
        let again = service
            .upgrade(
                &first.id,
                &UpgradeRequest {
                    email: "again@example.com".to_string(),
                    password: "correct-horse".to_string(),
                    role: "student".to_string(),
                },
            )
            .await;
        assert!(matches!(again, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_register_and_me_over_http() {
        let state = test_state().await;
        let router = with_state(auth_routes(), state.clone());

        let (status, body) = send(
            router.clone(),
            "POST",
            "/api/auth/register",
            None,
            Some(serde_json::json!({
                "email": "sadia@example.com",
                "password": "correct-horse",
                "role": "student",
                "username": "sadia"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], "student");
        let token = format!("Bearer {}", body["token"].as_str().unwrap());

        let (status, me) = send(router.clone(), "GET", "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["profile"]["username"], "sadia");
        assert_eq!(me["user"]["is_guest"], false);
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let state = test_state().await;
        let router = with_state(auth_routes(), state.clone());

        let (status, body) = send(router.clone(), "GET", "/api/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let user = create_user(&state, "query_token", "tutor").await;
        let token = bearer(&state, &user);
        let raw = token.trim_start_matches("Bearer ");
        let (status, _) = send(
            router,
            "GET",
            &format!("/api/me?access_token={}", raw),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_guest_endpoint_without_body() {
        let state = test_state().await;
        let router = with_state(auth_routes(), state);
        let (status, body) = send(router, "POST", "/api/auth/guest", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], "stranger");
        assert_eq!(body["user"]["is_guest"], true);
    }
}

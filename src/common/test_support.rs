//! Fixtures shared by the per-module test suites.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Extension, Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

use crate::auth::models::{RegisterRequest, User};
use crate::auth::AuthedUser;
use crate::auth::services::{issue_token, AuthService};
use crate::common::AppState;

pub use crate::common::migrations::test_support::test_pool;

pub async fn test_state() -> AppState {
    AppState::for_tests(test_pool().await)
}

/// Registers a full account with the given role and username.
pub async fn create_user(state: &AppState, username: &str, role: &str) -> User {
    AuthService::new(state.db.clone())
        .register(&RegisterRequest {
            email: format!("{}@example.com", username.replace(['.', '-'], "_")),
            password: "correct-horse".to_string(),
            role: role.to_string(),
            username: username.to_string(),
        })
        .await
        .expect("register test user")
}

/// The extractor value a request from this user would produce.
pub fn authed(user: &User) -> AuthedUser {
    AuthedUser {
        id: user.id.clone(),
        role: user.role(),
        is_guest: user.is_anonymous,
    }
}

pub fn bearer(state: &AppState, user: &User) -> String {
    format!(
        "Bearer {}",
        issue_token(user, &state.jwt_secret, 1).expect("token")
    )
}

/// Wraps routes with the state extension the way `main` does.
pub fn with_state(router: Router, state: AppState) -> Router {
    router.layer(Extension(Arc::new(RwLock::new(state))))
}

/// Sends one request and returns the status and parsed JSON body (Null when empty).
pub async fn send(
    router: Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = router.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[cfg(test)]
mod tests {
    use crate::common::test_support::{bearer, create_user, send, test_state, with_state};
    use crate::common::ApiError;
    use crate::shortener::models::CreateShortLinkRequest;
    use crate::shortener::services::ShortenerService;
    use crate::shortener::shortener_routes;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    fn request(url: &str, slug: Option<&str>) -> CreateShortLinkRequest {
        CreateShortLinkRequest {
            url: url.to_string(),
            slug: slug.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_and_resolve() {
        let state = test_state().await;
        let service = ShortenerService::new(state.db.clone(), "https://sg.example/");

        let created = service
            .create(&request("https://scholargrid.app/tutor/42", None), None)
            .await
            .unwrap();
        assert_eq!(created.slug.len(), 6);
        assert_eq!(created.short_url, format!("https://sg.example/s/{}", created.slug));

        assert_eq!(
            service.resolve(&created.slug).await.unwrap(),
            "https://scholargrid.app/tutor/42"
        );
        service.resolve(&created.slug).await.unwrap();
        assert_eq!(service.find(&created.slug).await.unwrap().hits, 2);

        assert!(matches!(
            service.resolve("nope").await.unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_custom_slug_conflict() {
        let state = test_state().await;
        let service = ShortenerService::new(state.db.clone(), "http://localhost:8080");

        service
            .create(&request("https://example.com/a", Some("physics")), None)
            .await
            .unwrap();
        let err = service
            .create(&request("https://example.com/b", Some("physics")), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_short_links_http() {
        let state = test_state().await;
        let owner = create_user(&state, "short_owner", "student").await;
        let auth = bearer(&state, &owner);
        let db = state.db.clone();
        let app = with_state(shortener_routes(), state);

        let (status, _) = send(
            app.clone(),
            "POST",
            "/api/short-links",
            None,
            Some(json!({ "url": "javascript:alert(1)" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // anonymous creation is allowed
        let (status, body) = send(
            app.clone(),
            "POST",
            "/api/short-links",
            None,
            Some(json!({ "url": "https://example.com/anon" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["short_url"].as_str().unwrap().starts_with("http://localhost:8080/s/"));

        let (status, body) = send(
            app.clone(),
            "POST",
            "/api/short-links",
            Some(&auth),
            Some(json!({ "url": "https://example.com/mine", "slug": "my-notes" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["slug"], "my-notes");

        let link = ShortenerService::new(db, "http://localhost:8080")
            .find("my-notes")
            .await
            .unwrap();
        assert_eq!(link.owner_id.as_deref(), Some(owner.id.as_str()));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/s/my-notes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://example.com/mine"
        );

        let (status, _) = send(app, "GET", "/s/unknown", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

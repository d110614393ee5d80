#[cfg(test)]
mod tests {
    use crate::common::test_support::{bearer, create_user, send, test_state, with_state};
    use crate::common::ApiError;
    use crate::messages::messages_routes;
    use crate::messages::services::*;
    use crate::messages::validators;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_validate_message_content() {
        // Valid message
        assert!(validators::validate_message_content("Hello, world!").is_ok());

        // Empty message
        assert!(validators::validate_message_content("").is_err());
        assert!(validators::validate_message_content("   ").is_err());

        // Too long message
        let long_message = "a".repeat(10001);
        assert!(validators::validate_message_content(&long_message).is_err());

        // Length counts characters, not bytes
        let bangla = "ক".repeat(10000);
        assert!(validators::validate_message_content(&bangla).is_ok());
    }

    #[tokio::test]
    async fn test_conversation_and_summaries() {
        let state = test_state().await;
        let student = create_user(&state, "msg_student", "student").await;
        let tutor = create_user(&state, "msg_tutor", "tutor").await;
        let other = create_user(&state, "msg_other", "tutor").await;
        let service = MessageService::new(state.db.clone());

        service.create_message(&student.id, &tutor.id, "Salam, are you free on Sundays?").await.unwrap();
        service.create_message(&tutor.id, &student.id, "Yes, after 5pm").await.unwrap();
        service.create_message(&tutor.id, &student.id, "Which class?").await.unwrap();
        service.create_message(&other.id, &student.id, "I also teach math").await.unwrap();

        let conversation = service.get_conversation(&student.id, &tutor.id).await.unwrap();
        let contents: Vec<&str> = conversation.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["Salam, are you free on Sundays?", "Yes, after 5pm", "Which class?"]
        );

        let summaries = service.list_conversations(&student.id).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].counterpart_id, other.id);
        assert_eq!(summaries[0].counterpart_username.as_deref(), Some("msg_other"));
        let with_tutor = &summaries[1];
        assert_eq!(with_tutor.unread_count, 2);
        assert_eq!(with_tutor.last_message.content, "Which class?");

        assert_eq!(service.mark_conversation_read(&student.id, &tutor.id).await.unwrap(), 2);
        let summaries = service.list_conversations(&student.id).await.unwrap();
        assert_eq!(summaries[1].unread_count, 0);
        // the tutor's own view never counts their outgoing messages
        let tutor_view = service.list_conversations(&tutor.id).await.unwrap();
        assert_eq!(tutor_view[0].unread_count, 1);
    }

    #[tokio::test]
    async fn test_send_rules() {
        let state = test_state().await;
        let student = create_user(&state, "rule_sender", "student").await;
        let service = MessageService::new(state.db.clone());

        assert!(matches!(
            service.create_message(&student.id, &student.id, "hi me").await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            service.create_message(&student.id, "U_NOBODY", "hello?").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_http_send_and_read() {
        let state = test_state().await;
        let student = create_user(&state, "http_sender", "student").await;
        let tutor = create_user(&state, "http_receiver", "tutor").await;
        let student_auth = bearer(&state, &student);
        let tutor_auth = bearer(&state, &tutor);
        let router = with_state(messages_routes(), state);

        let (status, _) = send(
            router.clone(),
            "POST",
            "/api/messages",
            Some(&student_auth),
            Some(json!({"receiver_id": tutor.id, "content": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, sent) = send(
            router.clone(),
            "POST",
            "/api/messages",
            Some(&student_auth),
            Some(json!({"receiver_id": tutor.id, "content": "  Can we start next week?  "})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sent["content"], "Can we start next week?");
        assert_eq!(sent["is_read"], false);

        let uri = format!("/api/messages/{}/read", student.id);
        let (status, body) = send(router.clone(), "POST", &uri, Some(&tutor_auth), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["marked"], 1);

        let uri = format!("/api/messages/{}", tutor.id);
        let (_, conversation) = send(router, "GET", &uri, Some(&student_auth), None).await;
        assert_eq!(conversation[0]["is_read"], true);
    }
}

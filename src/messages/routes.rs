use crate::messages::handlers;
use axum::{
    routing::{get, post},
    Router,
};

pub fn messages_routes() -> Router {
    Router::new()
        .route(
            "/api/messages",
            get(handlers::user::list_conversations).post(handlers::user::send_message),
        )
        .route(
            "/api/messages/:user_id",
            get(handlers::user::get_conversation),
        )
        // Mark incoming messages from a user as read
        .route(
            "/api/messages/:user_id/read",
            post(handlers::user::mark_conversation_read),
        )
}

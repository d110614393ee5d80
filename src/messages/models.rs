// src/messages/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
}

impl Message {
    /// The other participant from `user_id`'s point of view.
    pub fn counterpart_of(&self, user_id: &str) -> &str {
        if self.sender_id == user_id {
            &self.receiver_id
        } else {
            &self.sender_id
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: String,
    pub content: String,
}

/// One row of the inbox: the latest message with a counterpart
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub counterpart_id: String,
    pub counterpart_username: Option<String>,
    pub last_message: Message,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub marked: u64,
}

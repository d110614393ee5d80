use crate::common::error::ApiError;
use crate::common::id_generator::generate_message_id;
use crate::common::now_rfc3339;
use crate::messages::models::{ConversationSummary, Message};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{error, info};

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, is_read, created_at";

pub struct MessageService {
    db: SqlitePool,
}

impl MessageService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a new message
    pub async fn create_message(
        &self,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
    ) -> Result<Message, ApiError> {
        if sender_id == receiver_id {
            return Err(ApiError::BadRequest(
                "You cannot message yourself".to_string(),
            ));
        }

        let receiver: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
            .bind(receiver_id)
            .fetch_optional(&self.db)
            .await?;
        if receiver.is_none() {
            return Err(ApiError::NotFound("Receiver not found".to_string()));
        }

        let message_id = generate_message_id();

        sqlx::query(
            "INSERT INTO messages (id, sender_id, receiver_id, content, is_read, created_at) VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(&message_id)
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content.trim())
        .bind(now_rfc3339())
        .execute(&self.db)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                sender_id = %sender_id,
                message_id = %message_id,
                "Database error creating message"
            );
            ApiError::DatabaseError(e)
        })?;

        let message = sqlx::query_as::<_, Message>(&format!(
            "SELECT {} FROM messages WHERE id = ?",
            MESSAGE_COLUMNS
        ))
        .bind(&message_id)
        .fetch_one(&self.db)
        .await?;

        info!(
            sender_id = %sender_id,
            receiver_id = %receiver_id,
            message_id = %message_id,
            "Message created successfully"
        );

        Ok(message)
    }

    /// Messages between two users, oldest first
    pub async fn get_conversation(
        &self,
        user_id: &str,
        other_id: &str,
    ) -> Result<Vec<Message>, ApiError> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT {} FROM messages
            WHERE (sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1)
            ORDER BY created_at ASC, rowid ASC
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(user_id)
        .bind(other_id)
        .fetch_all(&self.db)
        .await?;

        Ok(messages)
    }

    /// One summary per counterpart, most recent conversation first
    pub async fn list_conversations(
        &self,
        user_id: &str,
    ) -> Result<Vec<ConversationSummary>, ApiError> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT {} FROM messages
            WHERE sender_id = ?1 OR receiver_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        let mut summaries: Vec<ConversationSummary> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for message in messages {
            let counterpart = message.counterpart_of(user_id).to_string();
            let unread = message.receiver_id == user_id && !message.is_read;
            match index.get(&counterpart) {
                Some(&i) => {
                    if unread {
                        summaries[i].unread_count += 1;
                    }
                }
                None => {
                    index.insert(counterpart.clone(), summaries.len());
                    summaries.push(ConversationSummary {
                        counterpart_id: counterpart,
                        counterpart_username: None,
                        unread_count: i64::from(unread),
                        last_message: message,
                    });
                }
            }
        }

        let usernames: Vec<(String, String)> =
            sqlx::query_as("SELECT id, username FROM profiles WHERE id IN (SELECT value FROM json_each(?))")
                .bind(serde_json::to_string(&index.keys().collect::<Vec<_>>()).unwrap_or_default())
                .fetch_all(&self.db)
                .await?;
        let usernames: HashMap<String, String> = usernames.into_iter().collect();
        for summary in &mut summaries {
            summary.counterpart_username = usernames.get(&summary.counterpart_id).cloned();
        }

        Ok(summaries)
    }

    /// Mark every incoming message from `other_id` as read
    pub async fn mark_conversation_read(
        &self,
        user_id: &str,
        other_id: &str,
    ) -> Result<u64, ApiError> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = 1 WHERE receiver_id = ? AND sender_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .bind(other_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        info!(
            user_id = %user_id,
            other_id = %other_id,
            marked = result.rows_affected(),
            "Conversation marked as read"
        );

        Ok(result.rows_affected())
    }
}

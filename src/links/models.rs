// src/links/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const SLUG_LENGTH: usize = 8;
pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_ANONYMOUS_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Link {
    pub id: String,
    pub owner_id: String,
    pub slug: String,
    pub title: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct CreateLinkRequest {
    pub title: Option<String>,
}

/// What a visitor sees before writing to an inbox
#[derive(Debug, Serialize, FromRow)]
pub struct PublicLink {
    pub slug: String,
    pub title: Option<String>,
    pub owner_username: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LinkMessage {
    pub id: String,
    pub link_id: String,
    pub content: String,
    pub sender_fingerprint: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct PostLinkMessageRequest {
    pub content: String,
    pub fingerprint: Option<String>,
}

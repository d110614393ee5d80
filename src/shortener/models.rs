// src/shortener/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const GENERATED_SLUG_LENGTH: usize = 6;
pub const MAX_URL_CHARS: usize = 2048;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ShortLink {
    pub slug: String,
    pub target_url: String,
    pub owner_id: Option<String>,
    pub hits: i64,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateShortLinkRequest {
    pub url: String,
    /// Custom slug, generated when absent
    pub slug: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShortLinkResponse {
    pub slug: String,
    pub short_url: String,
    pub target_url: String,
}

// src/reviews/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: String,
    pub reviewer_id: String,
    pub reviewee_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub is_strike: bool,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub reviewee_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    #[serde(default)]
    pub is_strike: bool,
}

/// Aggregate rating shown on tutor cards
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Reputation {
    pub average_rating: f64,
    pub review_count: i64,
    pub strike_count: i64,
}

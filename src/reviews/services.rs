// src/reviews/services.rs

use sqlx::SqlitePool;
use tracing::{info, warn};

use super::models::{CreateReviewRequest, Reputation, Review};
use super::validators::ReviewValidator;
use crate::common::{generate_review_id, now_rfc3339, ApiError, Validator};

pub struct ReviewsService {
    db: SqlitePool,
}

impl ReviewsService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Whether the two users share a contract that ever went live.
    async fn has_worked_together(&self, a: &str, b: &str) -> Result<bool, ApiError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM contracts
            WHERE ((student_id = ?1 AND tutor_id = ?2) OR (student_id = ?2 AND tutor_id = ?1))
              AND status IN ('active', 'terminated')
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.db)
        .await?;
        Ok(count > 0)
    }

    /// Create or replace the caller's review of another user
    pub async fn upsert_review(
        &self,
        reviewer_id: &str,
        request: &CreateReviewRequest,
    ) -> Result<Review, ApiError> {
        ReviewValidator.validate(request).into_result()?;

        let reviewee_id = request.reviewee_id.trim();
        if reviewee_id == reviewer_id {
            return Err(ApiError::BadRequest("You cannot review yourself".to_string()));
        }

        if !self.has_worked_together(reviewer_id, reviewee_id).await? {
            warn!(reviewer_id = %reviewer_id, reviewee_id = %reviewee_id, "Review rejected: no shared contract");
            return Err(ApiError::Forbidden(
                "You can only review someone you have had a contract with".to_string(),
            ));
        }

        let comment = request
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        sqlx::query(
            r#"
            INSERT INTO reviews (id, reviewer_id, reviewee_id, rating, comment, is_strike, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(reviewer_id, reviewee_id) DO UPDATE SET
                rating = excluded.rating,
                comment = excluded.comment,
                is_strike = excluded.is_strike,
                created_at = excluded.created_at
            "#,
        )
        .bind(generate_review_id())
        .bind(reviewer_id)
        .bind(reviewee_id)
        .bind(request.rating)
        .bind(comment)
        .bind(request.is_strike)
        .bind(now_rfc3339())
        .execute(&self.db)
        .await?;

        info!(
            reviewer_id = %reviewer_id,
            reviewee_id = %reviewee_id,
            rating = request.rating,
            is_strike = request.is_strike,
            "Review saved"
        );

        let review = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, reviewer_id, reviewee_id, rating, comment, is_strike, created_at
            FROM reviews WHERE reviewer_id = ? AND reviewee_id = ?
            "#,
        )
        .bind(reviewer_id)
        .bind(reviewee_id)
        .fetch_one(&self.db)
        .await?;
        Ok(review)
    }

    pub async fn reviews_for(&self, user_id: &str) -> Result<Vec<Review>, ApiError> {
        let reviews = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, reviewer_id, reviewee_id, rating, comment, is_strike, created_at
            FROM reviews WHERE reviewee_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(reviews)
    }

    pub async fn reputation(&self, user_id: &str) -> Result<Reputation, ApiError> {
        let (average, count, strikes): (Option<f64>, i64, Option<i64>) = sqlx::query_as(
            r#"
            SELECT AVG(rating), COUNT(*), SUM(is_strike)
            FROM reviews WHERE reviewee_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(Reputation {
            average_rating: average.map(round_rating).unwrap_or(0.0),
            review_count: count,
            strike_count: strikes.unwrap_or(0),
        })
    }
}

fn round_rating(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

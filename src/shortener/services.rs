// src/shortener/services.rs

use sqlx::SqlitePool;
use tracing::{debug, info};

use super::models::*;
use crate::common::{generate_slug, now_rfc3339, ApiError};

const SLUG_ATTEMPTS: usize = 5;

pub struct ShortenerService {
    db: SqlitePool,
    public_base_url: String,
}

impl ShortenerService {
    pub fn new(db: SqlitePool, public_base_url: &str) -> Self {
        Self {
            db,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn short_url(&self, slug: &str) -> String {
        format!("{}/s/{}", self.public_base_url, slug)
    }

    async fn slug_taken(&self, slug: &str) -> Result<bool, ApiError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT slug FROM short_links WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.is_some())
    }

    async fn pick_slug(&self, custom: Option<&str>) -> Result<String, ApiError> {
        if let Some(slug) = custom {
            if self.slug_taken(slug).await? {
                return Err(ApiError::Conflict(format!("Slug '{}' is already taken", slug)));
            }
            return Ok(slug.to_string());
        }

        for _ in 0..SLUG_ATTEMPTS {
            let slug = generate_slug(GENERATED_SLUG_LENGTH);
            if !self.slug_taken(&slug).await? {
                return Ok(slug);
            }
            debug!(slug = %slug, "Short link slug collision, retrying");
        }
        Err(ApiError::InternalServer(
            "Could not allocate a short link".to_string(),
        ))
    }

    /// Expects a validated request.
    pub async fn create(
        &self,
        request: &CreateShortLinkRequest,
        owner_id: Option<&str>,
    ) -> Result<ShortLinkResponse, ApiError> {
        let target_url = request.url.trim();
        let custom = request.slug.as_deref().map(str::trim);
        let slug = self.pick_slug(custom).await?;

        let inserted = sqlx::query(
            "INSERT INTO short_links (slug, target_url, owner_id, hits, created_at) VALUES (?, ?, ?, 0, ?)",
        )
        .bind(&slug)
        .bind(target_url)
        .bind(owner_id)
        .bind(now_rfc3339())
        .execute(&self.db)
        .await;

        if let Err(sqlx::Error::Database(db_err)) = &inserted {
            if db_err.is_unique_violation() {
                return Err(ApiError::Conflict(format!("Slug '{}' is already taken", slug)));
            }
        }
        inserted?;

        info!(slug = %slug, owner_id = ?owner_id, "Short link created");
        Ok(ShortLinkResponse {
            short_url: self.short_url(&slug),
            slug,
            target_url: target_url.to_string(),
        })
    }

    pub async fn find(&self, slug: &str) -> Result<ShortLink, ApiError> {
        sqlx::query_as::<_, ShortLink>(
            "SELECT slug, target_url, owner_id, hits, created_at FROM short_links WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Short link not found".to_string()))
    }

    /// Counts the visit and returns where to send the visitor.
    pub async fn resolve(&self, slug: &str) -> Result<String, ApiError> {
        let result = sqlx::query("UPDATE short_links SET hits = hits + 1 WHERE slug = ?")
            .bind(slug)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Short link not found".to_string()));
        }
        Ok(self.find(slug).await?.target_url)
    }
}

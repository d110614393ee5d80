// src/links/services.rs

use sqlx::SqlitePool;
use tracing::{debug, info};

use super::models::*;
use crate::common::{
    generate_link_id, generate_link_message_id, generate_slug, now_rfc3339, ApiError,
};

const LINK_COLUMNS: &str = "id, owner_id, slug, title, is_active, created_at";
const SLUG_ATTEMPTS: usize = 5;

pub struct LinksService {
    db: SqlitePool,
}

impl LinksService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn slug_taken(&self, slug: &str) -> Result<bool, ApiError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT id FROM links WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.is_some())
    }

    async fn unique_slug(&self) -> Result<String, ApiError> {
        for _ in 0..SLUG_ATTEMPTS {
            let slug = generate_slug(SLUG_LENGTH);
            if !self.slug_taken(&slug).await? {
                return Ok(slug);
            }
            debug!(slug = %slug, "Link slug collision, retrying");
        }
        Err(ApiError::InternalServer(
            "Could not allocate a link slug".to_string(),
        ))
    }

    pub async fn create(&self, owner_id: &str, title: Option<&str>) -> Result<Link, ApiError> {
        let id = generate_link_id();
        let slug = self.unique_slug().await?;
        let title = title.map(str::trim).filter(|t| !t.is_empty());

        sqlx::query(
            "INSERT INTO links (id, owner_id, slug, title, is_active, created_at) VALUES (?, ?, ?, ?, 1, ?)",
        )
        .bind(&id)
        .bind(owner_id)
        .bind(&slug)
        .bind(title)
        .bind(now_rfc3339())
        .execute(&self.db)
        .await?;

        info!(link_id = %id, owner_id = %owner_id, slug = %slug, "Anonymous link created");
        self.find(&id).await
    }

    async fn find(&self, id: &str) -> Result<Link, ApiError> {
        sqlx::query_as::<_, Link>(&format!("SELECT {} FROM links WHERE id = ?", LINK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Link not found".to_string()))
    }

    async fn find_owned(&self, id: &str, owner_id: &str) -> Result<Link, ApiError> {
        let link = self.find(id).await?;
        if link.owner_id != owner_id {
            return Err(ApiError::Forbidden("This link belongs to someone else".to_string()));
        }
        Ok(link)
    }

    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Link>, ApiError> {
        let links = sqlx::query_as::<_, Link>(&format!(
            "SELECT {} FROM links WHERE owner_id = ? ORDER BY created_at DESC, rowid DESC",
            LINK_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;
        Ok(links)
    }

    pub async fn public_link(&self, slug: &str) -> Result<PublicLink, ApiError> {
        sqlx::query_as::<_, PublicLink>(
            r#"
            SELECT l.slug, l.title, COALESCE(p.username, 'anonymous') AS owner_username
            FROM links l
            LEFT JOIN profiles p ON p.id = l.owner_id
            WHERE l.slug = ? AND l.is_active = 1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Link not found".to_string()))
    }

    /// Stores an anonymous message for an active link.
    pub async fn post_message(
        &self,
        slug: &str,
        content: &str,
        fingerprint: Option<&str>,
    ) -> Result<LinkMessage, ApiError> {
        let link: Option<(String,)> =
            sqlx::query_as("SELECT id FROM links WHERE slug = ? AND is_active = 1")
                .bind(slug)
                .fetch_optional(&self.db)
                .await?;
        let (link_id,) = link.ok_or_else(|| ApiError::NotFound("Link not found".to_string()))?;

        let id = generate_link_message_id();
        sqlx::query(
            "INSERT INTO linkhistory (id, link_id, content, sender_fingerprint, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&link_id)
        .bind(content.trim())
        .bind(fingerprint.map(str::trim).filter(|f| !f.is_empty()))
        .bind(now_rfc3339())
        .execute(&self.db)
        .await?;

        info!(link_id = %link_id, "Anonymous message received");
        let message = sqlx::query_as::<_, LinkMessage>(
            "SELECT id, link_id, content, sender_fingerprint, created_at FROM linkhistory WHERE id = ?",
        )
        .bind(&id)
        .fetch_one(&self.db)
        .await?;
        Ok(message)
    }

    pub async fn history(&self, link_id: &str, owner_id: &str) -> Result<Vec<LinkMessage>, ApiError> {
        self.find_owned(link_id, owner_id).await?;
        let messages = sqlx::query_as::<_, LinkMessage>(
            r#"
            SELECT id, link_id, content, sender_fingerprint, created_at FROM linkhistory
            WHERE link_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(link_id)
        .fetch_all(&self.db)
        .await?;
        Ok(messages)
    }

    pub async fn deactivate(&self, link_id: &str, owner_id: &str) -> Result<Link, ApiError> {
        self.find_owned(link_id, owner_id).await?;
        sqlx::query("UPDATE links SET is_active = 0 WHERE id = ?")
            .bind(link_id)
            .execute(&self.db)
            .await?;
        info!(link_id = %link_id, "Anonymous link deactivated");
        self.find(link_id).await
    }
}

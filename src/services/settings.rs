// src/services/settings.rs
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
struct CachedSetting {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Runtime provider settings (API keys, model names, base URLs).
///
/// Lookup order: in-memory cache, `system_settings` table, then the
/// uppercased key as an environment variable.
#[derive(Debug)]
pub struct SettingsService {
    db_pool: SqlitePool,
    cache: Arc<RwLock<HashMap<String, CachedSetting>>>,
    cache_ttl: Duration,
}

impl SettingsService {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self {
            db_pool,
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl: Duration::minutes(5),
        }
    }

    /// Get a setting value by key
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, SettingsError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(key) {
                if cached.expires_at > Utc::now() {
                    debug!(key = %key, "Setting retrieved from cache");
                    return Ok(Some(cached.value.clone()));
                }
            }
        }

        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM system_settings WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.db_pool)
                .await?;

        if let Some((value,)) = row {
            let mut cache = self.cache.write().await;
            cache.insert(
                key.to_string(),
                CachedSetting {
                    value: value.clone(),
                    expires_at: Utc::now() + self.cache_ttl,
                },
            );
            debug!(key = %key, "Setting retrieved from database");
            return Ok(Some(value));
        }

        match env::var(key.to_uppercase()) {
            Ok(env_value) if !env_value.trim().is_empty() => {
                debug!(key = %key, "Setting retrieved from environment variable");
                Ok(Some(env_value))
            }
            _ => {
                debug!(key = %key, "Setting not found");
                Ok(None)
            }
        }
    }

    /// Get a setting or fall back to a default value
    pub async fn get_or(&self, key: &str, default: &str) -> Result<String, SettingsError> {
        Ok(self
            .get_setting(key)
            .await?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Upserts a row in `system_settings` and drops the cached copy.
    #[cfg(test)]
    pub async fn set_setting(
        &self,
        key: &str,
        value: &str,
        updated_by: Option<&str>,
    ) -> Result<(), SettingsError> {
        sqlx::query(
            r#"
            INSERT INTO system_settings (key, value, updated_at, updated_by)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at,
                updated_by = excluded.updated_by
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .bind(updated_by)
        .execute(&self.db_pool)
        .await?;

        self.cache.write().await.remove(key);

        tracing::info!(key = %key, "Setting updated successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::migrations::test_support::test_pool;

    #[tokio::test]
    async fn test_database_value_wins_and_is_cached() {
        let service = SettingsService::new(test_pool().await);

        assert_eq!(
            service.get_or("scholargrid_test_model", "fallback").await.unwrap(),
            "fallback"
        );

        service
            .set_setting("scholargrid_test_model", "llama-3.3-70b-versatile", Some("test"))
            .await
            .unwrap();
        assert_eq!(
            service.get_setting("scholargrid_test_model").await.unwrap(),
            Some("llama-3.3-70b-versatile".to_string())
        );

        service
            .set_setting("scholargrid_test_model", "llama-3.1-8b-instant", None)
            .await
            .unwrap();
        assert_eq!(
            service.get_or("scholargrid_test_model", "fallback").await.unwrap(),
            "llama-3.1-8b-instant"
        );
    }

    #[tokio::test]
    async fn test_missing_setting_is_none() {
        let service = SettingsService::new(test_pool().await);
        assert_eq!(service.get_setting("scholargrid_missing_key").await.unwrap(), None);
    }
}

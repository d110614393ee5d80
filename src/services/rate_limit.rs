// src/services/rate_limit.rs
use crate::services::settings::SettingsService;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub authenticated_limit: u32,
    pub anonymous_limit: u32,
    pub per_ip_limit: u32,
    /// Requests per window for LLM / vision / geocoding routes
    pub ai_limit: u32,
    pub window_seconds: u32,
    pub whitelist_ips: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            authenticated_limit: 120,
            anonymous_limit: 30,
            per_ip_limit: 60,
            ai_limit: 10,
            window_seconds: 60,
            whitelist_ips: vec!["127.0.0.1".to_string(), "::1".to_string()],
        }
    }
}

fn parse_ip_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl RateLimitConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(enabled) = env::var("RATE_LIMIT_ENABLED") {
            config.enabled = enabled.to_lowercase() != "false";
        }

        let numeric = |name: &str| env::var(name).ok().and_then(|v| v.parse::<u32>().ok());

        if let Some(val) = numeric("RATE_LIMIT_AUTHENTICATED") {
            config.authenticated_limit = val;
        }
        if let Some(val) = numeric("RATE_LIMIT_ANONYMOUS") {
            config.anonymous_limit = val;
        }
        if let Some(val) = numeric("RATE_LIMIT_PER_IP") {
            config.per_ip_limit = val;
        }
        if let Some(val) = numeric("RATE_LIMIT_AI") {
            config.ai_limit = val;
        }
        if let Some(val) = numeric("RATE_LIMIT_WINDOW_SECONDS") {
            config.window_seconds = val;
        }

        if let Ok(whitelist) = env::var("RATE_LIMIT_WHITELIST_IPS") {
            config.whitelist_ips = parse_ip_list(&whitelist);
        }

        config
    }
}

/// Which counter a request is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitBucket {
    General,
    /// Routes that call out to Groq, Gemini or Nominatim
    Ai,
}

impl RateLimitBucket {
    pub fn for_path(path: &str) -> Self {
        const AI_PREFIXES: [&str; 5] = [
            "/api/ai-",
            "/api/search",
            "/api/identify-zone",
            "/api/gemini-",
            "/api/analyze-",
        ];
        if AI_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
            RateLimitBucket::Ai
        } else {
            RateLimitBucket::General
        }
    }
}

#[derive(Debug, Clone)]
struct RateLimitState {
    count: u32,
    window_start: Instant,
}

impl RateLimitState {
    fn new() -> Self {
        Self {
            count: 0,
            window_start: Instant::now(),
        }
    }

    fn reset(&mut self) {
        self.count = 0;
        self.window_start = Instant::now();
    }

    fn is_expired(&self, window_duration: Duration) -> bool {
        self.window_start.elapsed() > window_duration
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed,
    Limited { retry_after: u32 },
}

#[derive(Debug, Clone)]
pub struct RateLimitService {
    settings_service: Arc<SettingsService>,
    rate_limiter: Arc<RwLock<HashMap<String, RateLimitState>>>,
}

impl RateLimitService {
    pub fn new(settings_service: Arc<SettingsService>) -> Self {
        let env_config = RateLimitConfig::from_env();
        info!(
            enabled = env_config.enabled,
            authenticated_limit = env_config.authenticated_limit,
            anonymous_limit = env_config.anonymous_limit,
            per_ip_limit = env_config.per_ip_limit,
            ai_limit = env_config.ai_limit,
            window_seconds = env_config.window_seconds,
            whitelist_ips = ?env_config.whitelist_ips,
            "Initializing RateLimitService with env config"
        );
        Self {
            settings_service,
            rate_limiter: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn db_number(&self, env_name: &str, setting_key: &str) -> Option<u32> {
        if env::var(env_name).is_ok() {
            return None;
        }
        match self.settings_service.get_setting(setting_key).await {
            Ok(Some(value)) => value.parse::<u32>().ok(),
            _ => None,
        }
    }

    /// Environment variables take precedence over database settings
    pub async fn get_config(&self) -> RateLimitConfig {
        let mut config = RateLimitConfig::from_env();

        if env::var("RATE_LIMIT_ENABLED").is_err() {
            if let Ok(Some(enabled)) = self
                .settings_service
                .get_setting("rate_limit_enabled")
                .await
            {
                config.enabled = enabled.to_lowercase() == "true";
            }
        }

        if let Some(limit) = self
            .db_number("RATE_LIMIT_AUTHENTICATED", "rate_limit_authenticated_per_minute")
            .await
        {
            config.authenticated_limit = limit;
        }
        if let Some(limit) = self
            .db_number("RATE_LIMIT_ANONYMOUS", "rate_limit_anonymous_per_minute")
            .await
        {
            config.anonymous_limit = limit;
        }
        if let Some(limit) = self
            .db_number("RATE_LIMIT_PER_IP", "rate_limit_per_ip_per_minute")
            .await
        {
            config.per_ip_limit = limit;
        }
        if let Some(limit) = self.db_number("RATE_LIMIT_AI", "rate_limit_ai_per_minute").await {
            config.ai_limit = limit;
        }
        if let Some(seconds) = self
            .db_number("RATE_LIMIT_WINDOW_SECONDS", "rate_limit_window_seconds")
            .await
        {
            config.window_seconds = seconds;
        }

        if env::var("RATE_LIMIT_WHITELIST_IPS").is_err() {
            if let Ok(Some(whitelist)) = self
                .settings_service
                .get_setting("rate_limit_whitelist_ips")
                .await
            {
                config.whitelist_ips = parse_ip_list(&whitelist);
            }
        }

        config
    }

    /// Exact-match whitelist lookup
    fn is_whitelisted(&self, ip: &str, whitelist: &[String]) -> bool {
        whitelist.iter().any(|whitelisted_ip| whitelisted_ip == ip)
    }

    /// Check rate limit for a given identifier
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        ip_address: Option<&str>,
        is_authenticated: bool,
        bucket: RateLimitBucket,
    ) -> RateLimitResult {
        let config = self.get_config().await;
        self.check_with_config(&config, identifier, ip_address, is_authenticated, bucket)
            .await
    }

    async fn check_with_config(
        &self,
        config: &RateLimitConfig,
        identifier: &str,
        ip_address: Option<&str>,
        is_authenticated: bool,
        bucket: RateLimitBucket,
    ) -> RateLimitResult {
        if !config.enabled {
            return RateLimitResult::Allowed;
        }

        if let Some(ip) = ip_address {
            if self.is_whitelisted(ip, &config.whitelist_ips) {
                return RateLimitResult::Allowed;
            }
        }

        let window_duration = Duration::from_secs(config.window_seconds as u64);

        let (key, limit) = match bucket {
            RateLimitBucket::Ai => (format!("ai:{}", identifier), config.ai_limit),
            RateLimitBucket::General if is_authenticated => {
                (identifier.to_string(), config.authenticated_limit)
            }
            RateLimitBucket::General => (identifier.to_string(), config.anonymous_limit),
        };

        let result = self.check_limit_for_key(&key, limit, window_duration).await;
        if matches!(result, RateLimitResult::Limited { .. }) {
            return result;
        }

        if let Some(ip) = ip_address {
            let ip_key = format!("ip:{}", ip);
            return self
                .check_limit_for_key(&ip_key, config.per_ip_limit, window_duration)
                .await;
        }

        RateLimitResult::Allowed
    }

    async fn check_limit_for_key(
        &self,
        key: &str,
        limit: u32,
        window_duration: Duration,
    ) -> RateLimitResult {
        let mut limiter = self.rate_limiter.write().await;

        let state = limiter
            .entry(key.to_string())
            .or_insert_with(RateLimitState::new);

        if state.is_expired(window_duration) {
            state.reset();
        }

        if state.count >= limit {
            let elapsed = state.window_start.elapsed().as_secs() as u32;
            let retry_after = (window_duration.as_secs() as u32)
                .saturating_sub(elapsed)
                .max(1);
            return RateLimitResult::Limited { retry_after };
        }

        state.count += 1;
        RateLimitResult::Allowed
    }

    pub fn log_violation(&self, identifier: &str, ip_address: Option<&str>, endpoint: &str) {
        warn!(
            identifier = %identifier,
            ip_address = ?ip_address,
            endpoint = %endpoint,
            "Rate limit violation detected"
        );
    }

    /// Drops windows that have run out; called from a background interval in `main`.
    pub async fn cleanup_expired(&self, window_duration: Duration) {
        let mut limiter = self.rate_limiter.write().await;
        let before = limiter.len();
        limiter.retain(|_, state| !state.is_expired(window_duration));
        info!(removed = before - limiter.len(), "Cleaned up expired rate limit entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::migrations::test_support::test_pool;

    async fn create_test_service() -> RateLimitService {
        let settings_service = Arc::new(SettingsService::new(test_pool().await));
        RateLimitService::new(settings_service)
    }

    fn config(ai_limit: u32, authenticated_limit: u32) -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            authenticated_limit,
            anonymous_limit: 2,
            per_ip_limit: 1000,
            ai_limit,
            window_seconds: 60,
            whitelist_ips: vec!["127.0.0.1".to_string()],
        }
    }

    #[test]
    fn test_bucket_for_path() {
        assert_eq!(RateLimitBucket::for_path("/api/ai-chat"), RateLimitBucket::Ai);
        assert_eq!(RateLimitBucket::for_path("/api/search"), RateLimitBucket::Ai);
        assert_eq!(RateLimitBucket::for_path("/api/identify-zone"), RateLimitBucket::Ai);
        assert_eq!(RateLimitBucket::for_path("/api/gemini-bio-generator"), RateLimitBucket::Ai);
        assert_eq!(RateLimitBucket::for_path("/api/analyze-id-card"), RateLimitBucket::Ai);
        assert_eq!(RateLimitBucket::for_path("/api/tutors"), RateLimitBucket::General);
    }

    #[tokio::test]
    async fn test_blocks_when_limit_exceeded() {
        let service = create_test_service().await;
        let config = config(2, 3);

        for _ in 0..3 {
            let result = service
                .check_with_config(&config, "user:1", Some("10.0.0.1"), true, RateLimitBucket::General)
                .await;
            assert_eq!(result, RateLimitResult::Allowed);
        }
        let result = service
            .check_with_config(&config, "user:1", Some("10.0.0.1"), true, RateLimitBucket::General)
            .await;
        assert!(matches!(result, RateLimitResult::Limited { retry_after } if retry_after > 0));
    }

    #[tokio::test]
    async fn test_ai_bucket_is_separate_and_stricter() {
        let service = create_test_service().await;
        let config = config(1, 100);

        assert_eq!(
            service
                .check_with_config(&config, "user:2", None, true, RateLimitBucket::Ai)
                .await,
            RateLimitResult::Allowed
        );
        assert!(matches!(
            service
                .check_with_config(&config, "user:2", None, true, RateLimitBucket::Ai)
                .await,
            RateLimitResult::Limited { .. }
        ));
        // general traffic unaffected
        assert_eq!(
            service
                .check_with_config(&config, "user:2", None, true, RateLimitBucket::General)
                .await,
            RateLimitResult::Allowed
        );
    }

    #[tokio::test]
    async fn test_whitelist_bypasses_rate_limit() {
        let service = create_test_service().await;
        let config = config(1, 1);

        for _ in 0..10 {
            let result = service
                .check_with_config(&config, "user:3", Some("127.0.0.1"), true, RateLimitBucket::Ai)
                .await;
            assert_eq!(result, RateLimitResult::Allowed);
        }
    }

    #[tokio::test]
    async fn test_different_users_have_separate_limits() {
        let service = create_test_service().await;
        let config = config(10, 1);

        service
            .check_with_config(&config, "user:a", None, true, RateLimitBucket::General)
            .await;
        let result = service
            .check_with_config(&config, "user:b", None, true, RateLimitBucket::General)
            .await;
        assert_eq!(result, RateLimitResult::Allowed);
    }

    #[tokio::test]
    async fn test_disabled_allows_everything() {
        let service = create_test_service().await;
        let mut config = config(0, 0);
        config.enabled = false;
        assert_eq!(
            service
                .check_with_config(&config, "anon:x", None, false, RateLimitBucket::Ai)
                .await,
            RateLimitResult::Allowed
        );
    }
}

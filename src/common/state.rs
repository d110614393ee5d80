// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::appointments::events::AppointmentEvents;
use crate::common::dev_mode::DevModeConfig;
use crate::services::{GeminiService, GeocodingService, LlmService, Mailer, RateLimitService};

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    /// Base used when building short-link and anonymous-link URLs
    pub public_base_url: String,
    pub dev_mode: DevModeConfig,
    pub llm_service: Arc<LlmService>,
    pub gemini_service: Arc<GeminiService>,
    pub geocoding_service: Arc<GeocodingService>,
    pub mailer: Arc<dyn Mailer>,
    pub rate_limit_service: Arc<RateLimitService>,
    pub appointment_events: AppointmentEvents,
}

#[cfg(test)]
impl AppState {
    /// State wired to the given pool with providers left unconfigured.
    pub fn for_tests(db: SqlitePool) -> Self {
        let settings_service = Arc::new(crate::services::SettingsService::new(db.clone()));
        Self {
            jwt_secret: "test_secret_key".to_string(),
            jwt_ttl_hours: 1,
            public_base_url: "http://localhost:8080".to_string(),
            dev_mode: DevModeConfig::disabled(),
            llm_service: Arc::new(LlmService::new(settings_service.clone())),
            gemini_service: Arc::new(GeminiService::new(settings_service.clone())),
            geocoding_service: Arc::new(GeocodingService::new(settings_service.clone())),
            mailer: Arc::new(crate::services::LogMailer),
            rate_limit_service: Arc::new(RateLimitService::new(settings_service.clone())),
            appointment_events: AppointmentEvents::new(),
            db,
        }
    }
}

// src/services/mod.rs
//
// Shared services: provider clients and cross-cutting infrastructure
// used by the domain modules

pub mod gemini;
pub mod geocoding;
pub mod llm;
pub mod mailer;
pub mod rate_limit;
pub mod settings;

// Re-export commonly used types for convenience
pub use gemini::GeminiService;
pub use geocoding::GeocodingService;
pub use llm::LlmService;
pub use mailer::{LogMailer, Mailer};
pub use rate_limit::RateLimitService;
pub use settings::SettingsService;

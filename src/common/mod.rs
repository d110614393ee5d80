// Common module - shared types and utilities across all modules

pub mod dev_mode;
pub mod error;
pub mod geo;
pub mod helpers;
pub mod id_generator;
pub mod migrations;
pub mod state;
#[cfg(test)]
pub mod test_support;
pub mod validation;

// Re-export commonly used types for convenience
pub use error::ApiError;
pub use helpers::{now_rfc3339, parse_json_column, safe_email_log, to_json_column};
pub use id_generator::*;
pub use state::AppState;
pub use validation::{ValidationResult, Validator};

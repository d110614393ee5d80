//! Development mode configuration and utilities
//! Allows bypassing authentication for local testing

use std::env;

use crate::auth::models::Role;

/// Fixed id so every request in dev mode maps to the same account
pub const DEV_USER_ID: &str = "U_DEV00001";

#[derive(Debug, Clone)]
pub struct DevModeConfig {
    pub enabled: bool,
    pub user_email: String,
    pub username: String,
    pub user_role: Role,
}

impl DevModeConfig {
    pub fn from_env() -> Self {
        let enabled = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .to_lowercase()
            == "true";

        let user_email = env::var("DEV_USER_EMAIL").unwrap_or_else(|_| "dev@test.com".to_string());
        let username = env::var("DEV_USERNAME").unwrap_or_else(|_| "dev_user".to_string());
        let user_role = env::var("DEV_USER_ROLE")
            .ok()
            .and_then(|r| r.parse::<Role>().ok())
            .unwrap_or(Role::Student);

        Self {
            enabled,
            user_email,
            username,
            user_role,
        }
    }

    #[cfg(test)]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            user_email: "dev@test.com".to_string(),
            username: "dev_user".to_string(),
            user_role: Role::Student,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Print dev mode status on startup
pub fn print_dev_mode_status(config: &DevModeConfig) {
    if config.enabled {
        println!("⚠️  🔓 DEV MODE ENABLED 🔓 ⚠️");
        println!("   Authentication bypassed for testing");
        println!(
            "   Dev User: {} ({}) as {}",
            config.username,
            config.user_email,
            config.user_role.as_str()
        );
        println!("   ⚠️  DO NOT USE IN PRODUCTION ⚠️");
        println!();
    } else {
        println!("🔒 Production mode - Authentication required");
    }
}

/// CLI argument parsing for dev mode
pub fn parse_dev_mode_args<I>(args: I) -> Option<bool>
where
    I: IntoIterator<Item = String>,
{
    for arg in args {
        match arg.as_str() {
            "--dev" | "--dev-mode" => return Some(true),
            "--no-dev" | "--prod" | "--production" => return Some(false),
            _ => {}
        }
    }

    None
}

/// Override dev mode from CLI args
pub fn apply_cli_override(mut config: DevModeConfig) -> DevModeConfig {
    if let Some(cli_dev_mode) = parse_dev_mode_args(env::args()) {
        println!("🔧 CLI override: DEV_MODE = {}", cli_dev_mode);
        config.enabled = cli_dev_mode;
    }

    config
}

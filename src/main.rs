// src/main.rs
use axum::{extract::Extension, middleware, Router};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod ai;
mod applications;
mod appointments;
mod auth;
mod common;
mod contracts;
mod discovery;
mod links;
mod logging_middleware;
mod messages;
mod pitch;
mod profiles;
mod rate_limit_middleware;
mod reviews;
mod services;
mod shortener;

// ============================================================================
// COMMON IMPORTS
// ============================================================================

use appointments::events::AppointmentEvents;
use auth::services::AuthService;
use common::dev_mode::{apply_cli_override, print_dev_mode_status, DevModeConfig};
use common::AppState;
use rate_limit_middleware::rate_limit_middleware;
use services::{
    GeminiService, GeocodingService, LlmService, LogMailer, RateLimitService, SettingsService,
};

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://scholargrid.db".to_string());
    let jwt_secret = match env::var("JWT_SECRET") {
        Ok(secret) => secret,
        Err(_) => {
            warn!("JWT_SECRET not set, using an insecure development secret");
            "replace_with_strong_secret".to_string()
        }
    };
    let jwt_ttl_hours = env::var("JWT_TTL_HOURS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|hours| *hours > 0)
        .unwrap_or(24);
    let public_base_url =
        env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

    // ========================================================================
    // DEV MODE CONFIGURATION
    // ========================================================================

    let dev_mode = apply_cli_override(DevModeConfig::from_env());
    print_dev_mode_status(&dev_mode);

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    if let Some(path_part) = database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options = SqliteConnectOptions::from_str(&database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await?;

    common::migrations::run_migrations(&pool).await?;

    if dev_mode.is_enabled() {
        AuthService::new(pool.clone())
            .ensure_dev_user(&dev_mode)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create dev user: {}", e))?;
        info!("Dev user ready");
    }

    // ========================================================================
    // SERVICE INITIALIZATION
    // ========================================================================

    let settings_service = Arc::new(SettingsService::new(pool.clone()));
    info!("SettingsService initialized");

    let llm_service = Arc::new(LlmService::new(settings_service.clone()));
    info!("LlmService initialized");

    let gemini_service = Arc::new(GeminiService::new(settings_service.clone()));
    info!("GeminiService initialized");

    let geocoding_service = Arc::new(GeocodingService::new(settings_service.clone()));
    info!("GeocodingService initialized");

    let rate_limit_service = Arc::new(RateLimitService::new(settings_service.clone()));
    info!("RateLimitService initialized");

    // Expired limiter windows are dropped once a minute
    {
        let rate_limit_service = rate_limit_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                let window = rate_limit_service.get_config().await.window_seconds;
                rate_limit_service
                    .cleanup_expired(Duration::from_secs(window as u64))
                    .await;
            }
        });
    }

    let appointment_events = AppointmentEvents::new();
    info!("Appointment event feed initialized");

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let app_state = AppState {
        db: pool,
        jwt_secret,
        jwt_ttl_hours,
        public_base_url,
        dev_mode,
        llm_service,
        gemini_service,
        geocoding_service,
        mailer: Arc::new(LogMailer),
        rate_limit_service,
        appointment_events,
    };

    let shared = Arc::new(RwLock::new(app_state));

    // ========================================================================
    // ROUTER COMPOSITION
    // ========================================================================

    let app = Router::new()
        // ====================================================================
        // ACCOUNTS (Register, Login, Guest, Upgrade)
        // ====================================================================
        .merge(auth::auth_routes())
        // ====================================================================
        // PROFILES (Profile, Location, Tutor/Student Details, Varsity)
        // ====================================================================
        .merge(profiles::profiles_routes())
        // ====================================================================
        // DISCOVERY AND AI SEARCH
        // ====================================================================
        .merge(discovery::discovery_routes())
        .merge(ai::ai_routes())
        // ====================================================================
        // WORKFLOWS (Applications, Contracts, Appointments, Reviews)
        // ====================================================================
        .merge(applications::applications_routes())
        .merge(contracts::contracts_routes())
        .merge(appointments::appointments_routes())
        .merge(reviews::reviews_routes())
        // ====================================================================
        // MESSAGING (Direct Messages, Anonymous Links)
        // ====================================================================
        .merge(messages::messages_routes())
        .merge(links::links_routes())
        // ====================================================================
        // TOOLS (Short Links, Pitch Stats)
        // ====================================================================
        .merge(shortener::shortener_routes())
        .merge(pitch::pitch_routes())
        // ====================================================================
        // MIDDLEWARE AND LAYERS
        // ====================================================================
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(middleware::from_fn(rate_limit_middleware))
        .layer(Extension(shared.clone()))
        .layer({
            let cors_origins = env::var("CORS_ORIGINS").unwrap_or_else(|_| {
                "http://localhost:3000,http://localhost:5173".to_string()
            });

            let origins: Vec<axum::http::HeaderValue> = cors_origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                    axum::http::Method::PATCH,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::AUTHORIZATION,
                    axum::http::HeaderName::from_static("x-request-id"),
                ])
                .allow_credentials(true)
        })
        .layer(TraceLayer::new_for_http());

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

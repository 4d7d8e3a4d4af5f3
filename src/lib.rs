//! Accessibility Scan API Server
//!
//! Authenticated users request accessibility scans of URLs; results are stored
//! and exposed through history, statistics and email-report endpoints. The
//! analysis itself is delegated to an external scanning engine.

pub mod auth;
pub mod db;
pub mod error;
pub mod mailer;
pub mod models;
pub mod routes;
pub mod scanner;

use axum::routing::{get, post, put};
use axum::Router;
use mailer::Mailer;
use scanner::AccessibilityEngine;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub engine: Arc<dyn AccessibilityEngine>,
    pub mailer: Option<Mailer>,
    pub http: reqwest::Client,
    pub config: AppConfig,
}

/// Application configuration
#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub engine_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://a11y.db?mode=rwc".to_string()),
            jwt_secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "development-secret-change-in-production".to_string()),
            engine_url: std::env::var("SCANNER_ENGINE_URL")
                .unwrap_or_else(|_| "http://localhost:4000/scan".to_string()),
        }
    }
}

/// Whether detailed 5xx messages should be withheld from callers.
pub fn production_mode() -> bool {
    std::env::var("APP_ENV").map(|v| v == "production").unwrap_or(false)
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/api/auth/signup", post(routes::auth::signup))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/me", get(routes::auth::me))
        .route("/api/auth/update-profile", put(routes::auth::update_profile))
        .route("/scan", post(routes::scans::create_scan))
        .route(
            "/scan/:id",
            get(routes::scans::get_scan).delete(routes::scans::delete_scan),
        )
        .route("/scans", get(routes::scans::list_scans))
        .route("/stats", get(routes::reports::stats))
        .route("/activity", get(routes::reports::activity))
        .route("/email-scan-results", post(routes::email::email_scan_results))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

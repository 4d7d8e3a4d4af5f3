//! Accessibility Scan API Server

use a11y_api::mailer::Mailer;
use a11y_api::scanner::HttpEngine;
use a11y_api::{db, router, AppConfig, AppState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "a11y_api=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Accessibility Scan API Server");

    let config = AppConfig::default();

    let pool = db::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    db::migrate(&pool).await.expect("Failed to run migrations");

    let engine = HttpEngine::new(config.engine_url.clone())
        .expect("Failed to build scanner engine client");

    let mailer = Mailer::from_env();
    if mailer.is_none() {
        info!("No SMTP credentials found, email delivery disabled");
    }

    let http = reqwest::Client::builder()
        .user_agent("a11y-api/0.1")
        .build()
        .expect("Failed to build HTTP client");

    let state = Arc::new(AppState {
        db: pool,
        engine: Arc::new(engine),
        mailer,
        http,
        config: config.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listen address");
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, router(state))
        .await
        .expect("Server error");
}

//! HTTP surface for the report relay.
//!
//! One upload endpoint behind a shared-secret header, plus a health probe.
//! The pipeline stages (extract, render, deliver) live in their own crates;
//! this crate wires them together for a single request lifecycle and maps
//! the error taxonomy onto HTTP statuses.

mod auth;
mod config;
mod upload_routes;

pub use config::AppConfig;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use telegram_notifier::{NotifierConfig, TelegramNotifier};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub notifier: Arc<TelegramNotifier>,
}

/// Request-boundary errors, mapped to plain-text HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Bad or missing shared secret -> 401
    Auth(&'static str),
    /// Missing or empty upload -> 400
    Input(&'static str),
    /// Extraction, render, or delivery failure -> 500 with description
    Pipeline(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            AppError::Input(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            AppError::Pipeline(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, message).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(upload_routes::upload_routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(AppConfig::from_env());
    config.warn_on_insecure_defaults();

    let notifier = Arc::new(TelegramNotifier::new(NotifierConfig::new(
        config.telegram_bot_token.clone(),
        config.telegram_chat_id.clone(),
    )));

    let state = AppState {
        config: config.clone(),
        notifier,
    };
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutting down");
}

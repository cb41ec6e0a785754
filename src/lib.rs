pub mod catalog;
pub mod channels;
pub mod config;
pub mod error;
pub mod media;
pub mod resolver;
pub mod router;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};

use self::catalog::ReplyCatalog;
use self::channels::{line::LineClient, MessagingPlatform};
use self::config::{expand_tilde, load_config};
use self::media::{MediaStore, DOWNLOAD_ROUTE};
use self::resolver::ReplyResolver;
use self::router::EventRouter;
use self::types::WebhookBody;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub const LISTENING_NOTICE: &str = "I'm listening. Please access with POST.";

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub router: Arc<EventRouter>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Loads configuration from the environment and wires the production app
/// against the LINE Messaging API.
pub async fn create_app() -> anyhow::Result<(AppState, Router)> {
    let config = load_config();
    config.validate()?;
    let platform = LineClient::from_config(reqwest::Client::new(), &config)?;
    build_app(config, Arc::new(platform))
}

pub fn build_app(
    config: Config,
    platform: Arc<dyn MessagingPlatform>,
) -> anyhow::Result<(AppState, Router)> {
    let catalog = Arc::new(load_catalog(&config)?);
    info!(entries = catalog.len(), "reply catalog ready");

    let download_dir = expand_tilde(&config.media.download_dir);
    std::fs::create_dir_all(&download_dir)?;
    let media = MediaStore::new(download_dir.clone(), config.media.base_url.clone());

    let resolver = ReplyResolver::new(
        catalog,
        media,
        platform.clone(),
        config.media.video_preview_url.clone(),
    );
    let router = EventRouter::new(resolver, platform)
        .with_max_concurrency(config.webhook.max_concurrency)
        .with_event_timeout(config.webhook.event_timeout());

    let state = AppState {
        config: config.clone(),
        router: Arc::new(router),
    };

    let app = Router::new()
        .route(&config.webhook.path, get(listening).post(webhook))
        .route("/health", get(health))
        .nest_service(DOWNLOAD_ROUTE, ServeDir::new(download_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    Ok((state, app))
}

fn load_catalog(config: &Config) -> anyhow::Result<ReplyCatalog> {
    let path = expand_tilde(&config.catalog.path);
    if !path.exists() {
        warn!(path = %path.display(), "reply catalog not found, every text will be echoed");
        return Ok(ReplyCatalog::empty());
    }
    Ok(ReplyCatalog::load(&path)?)
}

async fn listening() -> &'static str {
    LISTENING_NOTICE
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn webhook(State(state): State<AppState>, Json(body): Json<WebhookBody>) -> impl IntoResponse {
    let outcome = state.router.dispatch(body.events).await;
    match outcome.into_values() {
        Some(values) => Json(values).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

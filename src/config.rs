use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_VIDEO_PREVIEW_URL: &str = "https://d.line-scdn.net/n/line_lp/img/ogimage.png";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub channel: ChannelConfig,
    pub webhook: WebhookConfig,
    pub media: MediaConfig,
    pub catalog: CatalogConfig,
    pub platform: PlatformConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Channel credentials issued by the LINE developers console.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub access_token: Option<String>,
    // Loaded for completeness; webhook signatures are not verified, so nothing reads it yet.
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub path: String,
    pub max_concurrency: usize,
    /// Per-event deadline in milliseconds; `0` disables it.
    pub event_timeout_ms: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            path: "/line/callback".to_string(),
            max_concurrency: 16,
            event_timeout_ms: 30_000,
        }
    }
}

impl WebhookConfig {
    pub fn event_timeout(&self) -> Option<Duration> {
        (self.event_timeout_ms > 0).then(|| Duration::from_millis(self.event_timeout_ms))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub base_url: Option<String>,
    pub download_dir: String,
    pub video_preview_url: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            download_dir: "public/downloaded".to_string(),
            video_preview_url: DEFAULT_VIDEO_PREVIEW_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: "data/catalog.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub api_base_url: String,
    pub data_api_base_url: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.line.me".to_string(),
            data_api_base_url: "https://api-data.line.me".to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if is_blank(self.channel.access_token.as_deref()) {
            return Err(Error::Config("channel access token is not set".to_string()));
        }
        if is_blank(self.media.base_url.as_deref()) {
            return Err(Error::Config("public base url is not set".to_string()));
        }
        if !self.webhook.path.starts_with('/') {
            return Err(Error::Config(format!(
                "webhook path must start with '/': {}",
                self.webhook.path
            )));
        }
        Ok(())
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn resolve_config_path() -> PathBuf {
    env::var("LINE_RESPONDER_CONFIG")
        .ok()
        .map(PathBuf::from)
        .unwrap_or_else(|| expand_tilde("~/.line-responder/config.json"))
}

pub fn load_config() -> Config {
    let config_path = resolve_config_path();

    let mut cfg = Config::default();

    if config_path.exists() {
        match fs::read_to_string(&config_path) {
            Ok(raw) => match serde_json::from_str::<Config>(&raw) {
                Ok(file_cfg) => cfg = file_cfg,
                Err(err) => warn!(path = %config_path.display(), "ignoring malformed config file: {err}"),
            },
            Err(err) => warn!(path = %config_path.display(), "cannot read config file: {err}"),
        }
    }

    apply_env_overrides(&mut cfg, |key| env::var(key).ok());
    cfg
}

/// Layers environment values over `cfg`. Blank values are ignored.
pub fn apply_env_overrides<F>(cfg: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(token) = get("CHANNEL_ACCESS_TOKEN") {
        cfg.channel.access_token = Some(token);
    }

    if let Some(secret) = get("CHANNEL_SECRET") {
        cfg.channel.secret = Some(secret);
    }

    if let Some(url) = get("BASE_URL") {
        cfg.media.base_url = Some(url);
    }

    if let Some(port) = get("PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => cfg.server.port = port,
            Err(_) => warn!(value = %port, "ignoring invalid PORT"),
        }
    }

    if let Some(host) = get("LINE_RESPONDER_HOST") {
        cfg.server.host = host;
    }

    if let Some(path) = get("LINE_RESPONDER_WEBHOOK_PATH") {
        cfg.webhook.path = path;
    }

    if let Some(path) = get("LINE_RESPONDER_CATALOG") {
        cfg.catalog.path = path;
    }

    if let Some(dir) = get("LINE_RESPONDER_MEDIA_DIR") {
        cfg.media.download_dir = dir;
    }
}

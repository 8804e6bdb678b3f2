//! Application state
//!
//! Holds all shared components and state

use crate::device_registry::DeviceRegistry;
use crate::error::{Error, Result};
use crate::imou_api::{ApiClient, Credentials, ImouApi, TokenManager, Transport};
use crate::preset_store::PresetService;
use crate::ptz_controller::PtzService;
use crate::storage::JsonStore;
use crate::usage_tracker::{ApiUsageTracker, DEFAULT_SAVE_DELAY};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default Open API base URL
pub const DEFAULT_URL_BASE: &str = "https://openapi.easy4ip.com";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Open API application id
    pub app_id: String,
    /// Open API application secret
    pub app_secret: String,
    /// Open API base URL
    pub url_base: String,
    /// Total timeout per vendor request
    pub request_timeout: Duration,
    /// Directory for presets and usage counters
    pub storage_dir: PathBuf,
    /// Delay before usage counters are written
    pub usage_save_delay: Duration,
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
}

impl AppConfig {
    /// Build from environment variables
    pub fn from_env() -> Result<Self> {
        let timeout_secs = env_parse("IMOU_REQUEST_TIMEOUT_SECS", 10u64)?;
        let port = env_parse("PORT", 8080u16)?;

        let config = Self {
            app_id: std::env::var("IMOU_APP_ID").unwrap_or_default(),
            app_secret: std::env::var("IMOU_APP_SECRET").unwrap_or_default(),
            url_base: std::env::var("IMOU_URL_BASE")
                .unwrap_or_else(|_| DEFAULT_URL_BASE.to_string()),
            request_timeout: Duration::from_secs(timeout_secs),
            storage_dir: std::env::var("IMOU_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/var/lib/imou-control")),
            usage_save_delay: DEFAULT_SAVE_DELAY,
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the Open API can never accept
    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            return Err(Error::Config("IMOU_APP_ID is required".to_string()));
        }
        if self.app_secret.trim().is_empty() {
            return Err(Error::Config("IMOU_APP_SECRET is required".to_string()));
        }
        let url = self.url_base.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(Error::Config(format!(
                "IMOU_URL_BASE must be an http(s) URL, got {:?}",
                self.url_base
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "IMOU_REQUEST_TIMEOUT_SECS must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.app_id.trim(),
            self.app_secret.trim(),
            self.url_base.trim(),
        )
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: {:?}", key, raw))),
        Err(_) => Ok(default),
    }
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub api: Arc<ApiClient>,
    pub tokens: Arc<TokenManager>,
    pub usage: Arc<ApiUsageTracker>,
    pub devices: Arc<DeviceRegistry>,
    pub ptz: Arc<PtzService>,
    pub presets: Arc<PresetService>,
}

impl AppState {
    /// Wire all components over one shared transport
    pub fn new(config: AppConfig, transport: Arc<dyn Transport>) -> Self {
        let store = JsonStore::new(config.storage_dir.clone());
        let usage = Arc::new(ApiUsageTracker::new(store.clone(), config.usage_save_delay));
        let ImouApi { client, tokens } =
            ImouApi::new(config.credentials(), transport, Some(usage.clone()));
        let devices = Arc::new(DeviceRegistry::new());
        let ptz = Arc::new(PtzService::new(client.clone(), devices.clone()));
        let presets = Arc::new(PresetService::new(store, ptz.clone(), devices.clone()));

        Self {
            config,
            api: client,
            tokens,
            usage,
            devices,
            ptz,
            presets,
        }
    }

    /// Restore persisted state and run best-effort device discovery
    pub async fn start(&self) {
        self.usage.load().await;
        self.presets.load().await;
        let added = self.devices.discover(&self.api).await;
        tracing::info!(devices_added = added, "Startup discovery complete");
    }
}

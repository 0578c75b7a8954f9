use crate::ui::app::Theme;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://chatgpt-wrapper-api.onrender.com";
pub const API_URL_ENV: &str = "PLANTFIX_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub theme: Theme,
    pub api_url: String,
    /// Sent as the `Referer` header when set.
    #[serde(default)]
    pub referer: Option<String>,
    /// Forwarded in the request body; the relay picks its default otherwise.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "AppConfig::default_timeout")]
    pub request_timeout_secs: u64,
    pub window_size: (f32, f32),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            api_url: DEFAULT_API_URL.to_string(),
            referer: None,
            model: None,
            request_timeout_secs: Self::default_timeout(),
            window_size: (560.0, 780.0),
        }
    }
}

impl AppConfig {
    fn default_timeout() -> u64 {
        120
    }

    /// Loads the user config, creating it with defaults on first run.
    /// `PLANTFIX_API_URL` wins over the stored endpoint.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::get_config_path()?)?;
        config.apply_env_override(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: AppConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        tracing::info!("Configuration saved to {:?}", config_path);
        Ok(())
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;

        Ok(config_dir.join("plantfix-chat").join("config.json"))
    }

    pub fn apply_env_override(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            tracing::info!("Using endpoint from {}: {}", API_URL_ENV, url);
            self.api_url = url.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| anyhow::anyhow!("Invalid API URL {:?}: {}", self.api_url, e))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow::anyhow!("API URL must use http or https, got {}", url.scheme()));
        }

        if self.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Request timeout must be greater than 0"));
        }

        Ok(())
    }
}

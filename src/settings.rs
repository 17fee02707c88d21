use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Service configuration: built-in defaults, then an optional `Config.toml`,
/// then environment variables (`PORT`, `LLM_API_KEY`, ...).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_address: String,
    pub port: u16,
    pub debug: bool,
    pub dataset_url: Option<String>,
    pub dataset_path: String,
    pub llm_provider: String,
    pub llm_api_key: String,
    pub llm_model: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    pub llm_timeout_secs: u64,
    pub enable_cache: bool,
    pub cache_expiry: u64,
    pub cache_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            debug: false,
            dataset_url: None,
            dataset_path: "cambodia_travel_data.json".to_string(),
            llm_provider: "none".to_string(),
            llm_api_key: String::new(),
            llm_model: None,
            llm_base_url: None,
            llm_temperature: 0.7,
            llm_max_tokens: 500,
            llm_timeout_secs: 30,
            enable_cache: true,
            cache_expiry: 3600,
            cache_dir: "cache".to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("Config").required(false))
            .add_source(config::Environment::default().try_parsing(true))
            .build()
            .context("Failed to read configuration")?;
        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_expiry)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// `Option` fields set to an empty string in the environment read as unset.
    pub fn dataset_url(&self) -> Option<&str> {
        self.dataset_url.as_deref().filter(|s| !s.trim().is_empty())
    }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:8020";
pub const DEFAULT_RECORDS_PER_PAGE: usize = 3;
pub const DEFAULT_RESULTS_PER_PAGE: usize = 1;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const ENV_API_ENDPOINT: &str = "SCRIBE_API_ENDPOINT";
pub const ENV_RECORDS_PER_PAGE: &str = "SCRIBE_RECORDS_PER_PAGE";
pub const ENV_RESULTS_PER_PAGE: &str = "SCRIBE_RESULTS_PER_PAGE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to write config {path}: {message}")]
    Write { path: String, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Origin of the transcription/records service, without trailing slash
    pub api_endpoint: String,
    pub records_per_page: usize,
    pub results_per_page: usize,
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            records_per_page: DEFAULT_RECORDS_PER_PAGE,
            results_per_page: DEFAULT_RESULTS_PER_PAGE,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `.env` and process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Defaults, then the JSON file at `path` (created if missing), then environment
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let mut config = load_or_create(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_API_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            self.api_endpoint = endpoint;
        }
        if let Some(raw) = lookup(ENV_RECORDS_PER_PAGE) {
            self.records_per_page = parse_page_size(ENV_RECORDS_PER_PAGE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_RESULTS_PER_PAGE) {
            self.results_per_page = parse_page_size(ENV_RESULTS_PER_PAGE, &raw)?;
        }
        normalize_config(self);
        Ok(())
    }
}

pub fn normalize_endpoint(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_ENDPOINT.to_string()
    } else {
        trimmed.to_string()
    }
}

fn normalize_config(config: &mut ClientConfig) {
    config.api_endpoint = normalize_endpoint(&config.api_endpoint);
    config.records_per_page = config.records_per_page.max(1);
    config.results_per_page = config.results_per_page.max(1);
    config.connect_timeout_secs = config.connect_timeout_secs.max(1);
}

fn parse_page_size(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

pub fn load_or_create(path: &Path) -> Result<ClientConfig, ConfigError> {
    if !path.exists() {
        let config = ClientConfig::default();
        save_raw(path, &config)?;
        return Ok(config);
    }

    let raw = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    match serde_json::from_str::<ClientConfig>(&raw) {
        Ok(mut config) => {
            normalize_config(&mut config);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!("Config {} unreadable ({}), restoring defaults", path.display(), e);
            let backup = path.with_extension("json.bak");
            let _ = fs::copy(path, backup);
            let config = ClientConfig::default();
            save_raw(path, &config)?;
            Ok(config)
        }
    }
}

fn save_raw(path: &Path, config: &ClientConfig) -> Result<(), ConfigError> {
    let write_error = |message: String| ConfigError::Write {
        path: path.display().to_string(),
        message,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
    }
    let json = serde_json::to_string_pretty(config).map_err(|e| write_error(e.to_string()))?;
    fs::write(path, json).map_err(|e| write_error(e.to_string()))
}

//! Configuration loading and backend URL resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Compiled fallback for the inference backend
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Default listen port for cardio-ui
pub const DEFAULT_PORT: u16 = 5780;

/// Default listen address for cardio-ui
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Inference can take minutes server-side
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Primary environment variable for the backend base URL
pub const API_BASE_URL_ENV: &str = "CARDIO_API_BASE_URL";

/// Unprefixed fallback, matching what the frontend build tooling exports
pub const FALLBACK_API_BASE_URL_ENV: &str = "API_BASE_URL";

/// Optional TOML configuration file contents
///
/// All keys are optional; absent keys fall through to the compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TomlConfig {
    pub api_base_url: Option<String>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Where the effective backend URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    CommandLine,
    Environment,
    ConfigFile,
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConfigSource::CommandLine => "command line",
            ConfigSource::Environment => "environment",
            ConfigSource::ConfigFile => "config file",
            ConfigSource::Default => "compiled default",
        };
        f.write_str(s)
    }
}

/// Values supplied on the command line (highest priority)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    /// Explicit config file; unlike the default location it must exist
    pub config_path: Option<PathBuf>,
}

/// Effective cardio-ui configuration
#[derive(Debug, Clone)]
pub struct UiConfig {
    pub api_base_url: String,
    pub api_base_url_source: ConfigSource,
    pub bind: String,
    pub port: u16,
    pub request_timeout: Duration,
}

impl UiConfig {
    /// Resolve configuration following priority order:
    /// 1. Command-line argument (highest priority)
    /// 2. Environment variable
    /// 3. TOML config file
    /// 4. Compiled default (fallback)
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        Self::resolve_with_env(overrides, |key| std::env::var(key).ok())
    }

    /// Same as [`UiConfig::resolve`] with an injectable environment lookup
    pub fn resolve_with_env<F>(overrides: &ConfigOverrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let toml_config = match &overrides.config_path {
            Some(path) => load_toml_config(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => load_toml_config(&path).unwrap_or_else(|e| {
                    warn!("Ignoring unreadable config file {}: {}", path.display(), e);
                    TomlConfig::default()
                }),
                _ => TomlConfig::default(),
            },
        };

        let env_url = env(API_BASE_URL_ENV)
            .or_else(|| env(FALLBACK_API_BASE_URL_ENV))
            .filter(|v| !v.trim().is_empty());

        let (raw_url, source) = if let Some(url) = &overrides.api_base_url {
            (url.clone(), ConfigSource::CommandLine)
        } else if let Some(url) = env_url {
            (url, ConfigSource::Environment)
        } else if let Some(url) = &toml_config.api_base_url {
            (url.clone(), ConfigSource::ConfigFile)
        } else {
            (DEFAULT_API_BASE_URL.to_string(), ConfigSource::Default)
        };

        let api_base_url = normalize_base_url(&raw_url)?;
        debug!(url = %api_base_url, source = %source, "Resolved backend base URL");

        let port = overrides
            .port
            .or(toml_config.port)
            .unwrap_or(DEFAULT_PORT);
        let bind = overrides
            .bind
            .clone()
            .or(toml_config.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let timeout_secs = toml_config
            .request_timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Ok(Self {
            api_base_url,
            api_base_url_source: source,
            bind,
            port,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// `host:port` string suitable for `TcpListener::bind`
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Trim whitespace and trailing slashes, and require an http(s) scheme
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Config("Backend base URL is empty".to_string()));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "Backend base URL must start with http:// or https://: {}",
            trimmed
        )));
    }
    Ok(trimmed.to_string())
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Platform config location, e.g. `~/.config/cardiosense/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cardiosense").join("config.toml"))
}

//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const TOKEN_STORAGE_KEY: &str = "constellation_token";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_HEALTH_STALE_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
    #[error("{var} must start with http:// or https://, got {value}")]
    InvalidUrl { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub token_path: PathBuf,
    pub timeouts: Timeouts,
    pub health_stale_secs: u64,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `CONSTELLATION_API_BASE_URL`: default `http://localhost:8000/api`
    /// - `CONSTELLATION_TOKEN_FILE`: default `<data dir>/constellation/constellation_token`
    /// - `CONSTELLATION_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CONSTELLATION_CONNECT_TIMEOUT_SECS`: default 10
    /// - `CONSTELLATION_HEALTH_STALE_SECS`: default 30
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or not an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_base_url(None)
    }

    /// Same as [`from_env`](Self::from_env), but an explicit `base_url`
    /// replaces `CONSTELLATION_API_BASE_URL`, which is then not read at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen base URL is empty or not an http(s) URL.
    pub fn from_env_with_base_url(base_url: Option<&str>) -> Result<Self, ConfigError> {
        let api_base_url = match (base_url, std::env::var("CONSTELLATION_API_BASE_URL")) {
            (Some(raw), _) => normalize_base_url("api_base_url", raw)?,
            (None, Ok(raw)) => normalize_base_url("CONSTELLATION_API_BASE_URL", &raw)?,
            (None, Err(_)) => DEFAULT_API_BASE_URL.to_owned(),
        };
        let token_path = match std::env::var("CONSTELLATION_TOKEN_FILE") {
            Ok(raw) if !raw.trim().is_empty() => PathBuf::from(raw.trim()),
            _ => default_token_path(),
        };
        let timeouts = Timeouts {
            request_secs: env_parse_u64("CONSTELLATION_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("CONSTELLATION_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let health_stale_secs = env_parse_u64("CONSTELLATION_HEALTH_STALE_SECS", DEFAULT_HEALTH_STALE_SECS);

        Ok(Self { api_base_url, token_path, timeouts, health_stale_secs })
    }

    /// Config pointing at `api_base_url` with every other value defaulted.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or not an http(s) URL.
    pub fn for_base_url(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: normalize_base_url("api_base_url", api_base_url)?,
            token_path: default_token_path(),
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            health_stale_secs: DEFAULT_HEALTH_STALE_SECS,
        })
    }

    #[must_use]
    pub fn health_stale_after(&self) -> Duration {
        Duration::from_secs(self.health_stale_secs)
    }
}

fn normalize_base_url(var: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::Empty { var });
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidUrl { var, value: trimmed.to_owned() });
    }
    Ok(trimmed.to_owned())
}

/// Durable credential location: the platform data dir, falling back to the
/// working directory when the platform reports none.
#[must_use]
pub fn default_token_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("constellation")
        .join(TOKEN_STORAGE_KEY)
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

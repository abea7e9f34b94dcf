//! Pipeline and provider configuration.
//!
//! `PipelineConfig` is a TOML document in which every field has a default, so
//! an empty file (or no file at all) gives the standard run: 300 markets,
//! pages of 25, 90-day daily history, a partition every 25 markets.
//!
//! `ProviderConfig` carries the credential and transport settings and is read
//! from the process environment; a missing API key is a startup error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.domeapi.io/v1";
pub const API_KEY_VAR: &str = "DOME_API_KEY";
pub const TIMEOUT_VAR: &str = "DOME_TIMEOUT_SECS";
pub const BASE_URL_VAR: &str = "DOME_BASE_URL";
pub const MIN_INTERVAL_VAR: &str = "DOME_MIN_REQUEST_INTERVAL_MS";

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set; export it or add it to .env")]
    MissingCredential(String),

    #[error("invalid {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(String),
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub discovery: DiscoveryConfig,
    pub acquisition: AcquisitionConfig,
    pub output: OutputConfig,
}

/// Market catalog paging and selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Stop once this many eligible markets have been found.
    pub max_markets: usize,
    /// Catalog page size.
    pub page_limit: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_markets: 300,
            page_limit: 25,
        }
    }
}

/// Candlestick history window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Days of history before each market's end time.
    pub lookback_days: u32,
    /// Candlestick bucket width in minutes.
    pub interval_minutes: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            interval_minutes: 1440,
        }
    }
}

impl AcquisitionConfig {
    pub fn lookback_secs(&self) -> i64 {
        i64::from(self.lookback_days) * SECONDS_PER_DAY
    }
}

/// Partition output and view catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub out_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub view_name: String,
    /// Markets per partition file.
    pub write_every: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("data/silver_features"),
            catalog_path: PathBuf::from("data/catalog/pmml.json"),
            view_name: "features".to_string(),
            write_every: 25,
        }
    }
}

impl PipelineConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string. Missing keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the run meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("discovery.max_markets", self.discovery.max_markets),
            ("discovery.page_limit", self.discovery.page_limit),
            ("output.write_every", self.output.write_every),
            ("acquisition.lookback_days", self.acquisition.lookback_days as usize),
            ("acquisition.interval_minutes", self.acquisition.interval_minutes as usize),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        if self.output.view_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "output.view_name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Credential and transport settings for the Dome API client.
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub timeout: Duration,
    pub base_url: String,
    /// Minimum spacing between consecutive requests.
    pub min_request_interval: Duration,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("base_url", &self.base_url)
            .field("min_request_interval", &self.min_request_interval)
            .finish()
    }
}

impl ProviderConfig {
    /// Provider settings with the standard timeout (120 s) and pacing (1050 ms).
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            timeout: Duration::from_secs(120),
            base_url: DEFAULT_BASE_URL.to_string(),
            min_request_interval: Duration::from_millis(1050),
        }
    }

    /// Read provider settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read provider settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingCredential(API_KEY_VAR.to_string()))?;
        let mut config = Self::new(api_key.trim());

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            config.timeout = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|s| *s > 0.0)
                .and_then(|s| Duration::try_from_secs_f64(s).ok())
                .ok_or_else(|| ConfigError::Invalid {
                    field: TIMEOUT_VAR.to_string(),
                    reason: format!("expected a positive number of seconds, got '{raw}'"),
                })?;
        }

        if let Some(url) = lookup(BASE_URL_VAR).filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup(MIN_INTERVAL_VAR) {
            let ms = raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                field: MIN_INTERVAL_VAR.to_string(),
                reason: format!("expected milliseconds, got '{raw}'"),
            })?;
            config.min_request_interval = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_standard_run() {
        let config = PipelineConfig::default();
        assert_eq!(config.discovery.max_markets, 300);
        assert_eq!(config.discovery.page_limit, 25);
        assert_eq!(config.acquisition.lookback_days, 90);
        assert_eq!(config.acquisition.interval_minutes, 1440);
        assert_eq!(config.acquisition.lookback_secs(), 90 * 24 * 3600);
        assert_eq!(config.output.write_every, 25);
        assert_eq!(config.output.view_name, "features");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
[discovery]
max_markets = 50

[output]
out_dir = "/tmp/features"
"#,
        )
        .unwrap();
        assert_eq!(config.discovery.max_markets, 50);
        assert_eq!(config.discovery.page_limit, 25);
        assert_eq!(config.output.out_dir, PathBuf::from("/tmp/features"));
        assert_eq!(config.output.write_every, 25);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(PipelineConfig::from_toml("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn zero_write_every_is_rejected() {
        let err = PipelineConfig::from_toml("[output]\nwrite_every = 0\n").unwrap_err();
        assert!(err.to_string().contains("output.write_every"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = PipelineConfig::from_toml("[discovery\nmax_markets = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let err = ProviderConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(ref v) if v == API_KEY_VAR));

        let err = ProviderConfig::from_lookup(lookup(&[(API_KEY_VAR, "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(_)));
    }

    #[test]
    fn provider_env_overrides() {
        let config = ProviderConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "secret"),
            (TIMEOUT_VAR, "30.5"),
            (BASE_URL_VAR, "http://localhost:8080/v1/"),
            (MIN_INTERVAL_VAR, "0"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.timeout, Duration::from_secs_f64(30.5));
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.min_request_interval, Duration::ZERO);
    }

    #[test]
    fn provider_defaults() {
        let config = ProviderConfig::from_lookup(lookup(&[(API_KEY_VAR, "k")])).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.min_request_interval, Duration::from_millis(1050));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err =
            ProviderConfig::from_lookup(lookup(&[(API_KEY_VAR, "k"), (TIMEOUT_VAR, "-1")]))
                .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        for raw in ["1e30", "inf", "NaN", "0"] {
            let err =
                ProviderConfig::from_lookup(lookup(&[(API_KEY_VAR, "k"), (TIMEOUT_VAR, raw)]))
                    .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == TIMEOUT_VAR));
        }
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = ProviderConfig::new("super-secret");
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}

//! Gateway configuration.
//!
//! Built once at startup and handed to [`crate::gateway::Gateway`]; nothing
//! in the request path reads the environment.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::bots::{BotRegistry, RegistryError};
use crate::provider::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiSettings};

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(8);

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid upstream base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Immutable configuration for the chat gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Bot personas; shared read-only between requests.
    pub registry: Arc<BotRegistry>,
    /// Upstream provider connection settings.
    pub openai: OpenAiSettings,
    /// Per-attempt bound on the upstream call.
    pub upstream_timeout: Duration,
    /// Extra attempts for transient upstream failures before falling back.
    pub upstream_retries: u32,
    /// Serve canned replies on upstream failure. When off, upstream failures
    /// surface as internal errors.
    pub fallback_enabled: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            registry: Arc::new(BotRegistry::builtin()),
            openai: OpenAiSettings::default(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            upstream_retries: 0,
            fallback_enabled: true,
        }
    }
}

impl GatewayConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                | Default                     |
    /// |-------------------------|-----------------------------|
    /// | `OPENAI_API_KEY`        | unset (always falls back)   |
    /// | `OPENAI_MODEL`          | `gpt-4o-mini`               |
    /// | `OPENAI_BASE_URL`       | `https://api.openai.com/v1` |
    /// | `UPSTREAM_TIMEOUT_SECS` | `8`                         |
    /// | `UPSTREAM_RETRIES`      | `0`                         |
    /// | `FALLBACK_ENABLED`      | `true`                      |
    /// | `BOTS_FILE`             | unset (built-in registry)   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookup = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self::from_lookup(lookup)
    }

    /// Same as [`Self::from_env`] but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Url::parse(&base_url)?;

        let upstream_timeout = match lookup("UPSTREAM_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_value("UPSTREAM_TIMEOUT_SECS", &v)?),
            None => DEFAULT_UPSTREAM_TIMEOUT,
        };
        if upstream_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "UPSTREAM_TIMEOUT_SECS",
                value: "0".into(),
            });
        }

        let upstream_retries = match lookup("UPSTREAM_RETRIES") {
            Some(v) => parse_value("UPSTREAM_RETRIES", &v)?,
            None => 0,
        };

        let fallback_enabled = match lookup("FALLBACK_ENABLED") {
            Some(v) => parse_bool("FALLBACK_ENABLED", &v)?,
            None => true,
        };

        let registry = match lookup("BOTS_FILE") {
            Some(path) => BotRegistry::load(&PathBuf::from(path))?,
            None => BotRegistry::builtin(),
        };

        Ok(Self {
            registry: Arc::new(registry),
            openai: OpenAiSettings {
                api_key: lookup("OPENAI_API_KEY"),
                model: lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url,
            },
            upstream_timeout,
            upstream_retries,
            fallback_enabled,
        })
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

/// Accepts `true/false`, `1/0`, `yes/no`, `on/off` (case-insensitive).
pub fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

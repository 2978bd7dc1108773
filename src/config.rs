// src/config.rs

use std::{env, fmt, net::IpAddr, str::FromStr, time::Duration};

use dotenvy::dotenv;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_NGROK_API_URL: &str = "http://127.0.0.1:4040";

/// Process-wide configuration. Loaded once at startup and never reloaded.
#[derive(Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,

    /// Tunnel provisioning is skipped when no token is configured.
    pub ngrok_authtoken: Option<String>,
    pub ngrok_bin: String,
    pub ngrok_api_url: String,

    pub host: IpAddr,
    pub port: u16,

    /// Wall-clock budget for one call to the model, permit wait included.
    pub generation_timeout: Duration,
    pub max_inflight_generations: usize,

    pub rust_log: String,
}

/// Raised when the environment cannot produce a valid `Config`.
#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from `lookup`, applying defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let gemini_api_key = non_blank("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;

        Ok(Self {
            gemini_api_key,
            gemini_model: var_or("GEMINI_MODEL", DEFAULT_MODEL),
            gemini_base_url: var_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            ngrok_authtoken: non_blank("NGROK_AUTHTOKEN"),
            ngrok_bin: var_or("NGROK_BIN", "ngrok"),
            ngrok_api_url: var_or("NGROK_API_URL", DEFAULT_NGROK_API_URL),
            host: parse_var(&lookup, "HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_var(&lookup, "PORT", 5000)?,
            generation_timeout: Duration::from_secs(parse_var(&lookup, "GENERATION_TIMEOUT_SECS", 20)?),
            max_inflight_generations: parse_var(&lookup, "MAX_INFLIGHT_GENERATIONS", 16)?,
            rust_log: var_or("RUST_LOG", "info"),
        })
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("tunnel_enabled", &self.ngrok_authtoken.is_some())
            .field("host", &self.host)
            .field("port", &self.port)
            .field("generation_timeout", &self.generation_timeout)
            .field("max_inflight_generations", &self.max_inflight_generations)
            .finish_non_exhaustive()
    }
}

fn parse_var<T: FromStr>(
    lookup: impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

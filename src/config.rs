use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Settings for the completion backend. The API key is resolved separately
/// so it never sits in a struct that gets logged.
#[derive(Clone, Debug)]
pub struct LlmSettings {
    pub base_url: String,
    pub default_model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub fetch_timeout: Duration,
    pub llm: LlmSettings,
    pub openai_api_key: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_addr", &self.server_addr)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("llm", &self.llm)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("PORT").unwrap_or_else(|| "3000".to_string());
        let port = port
            .parse::<u16>()
            .map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let fetch_timeout = match lookup("FETCH_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| AppError::ConfigError(format!("Invalid fetch timeout: {}", e)))?,
            None => Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        };

        let llm = LlmSettings {
            base_url: lookup("OPENAI_BASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            default_model: lookup("OPENAI_MODEL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            fetch_timeout,
            llm,
            openai_api_key: lookup(API_KEY_VAR).filter(|k| !k.trim().is_empty()),
        })
    }
}

/// Resolve the API credential: explicit value first, then `lookup(OPENAI_API_KEY)`.
///
/// Blank values count as absent.
pub fn resolve_api_key<F>(explicit: Option<&str>, lookup: F) -> Result<String>
where
    F: FnOnce(&str) -> Option<String>,
{
    if let Some(key) = explicit.map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    lookup(API_KEY_VAR)
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or(AppError::MissingCredential)
}

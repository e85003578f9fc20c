pub mod api;
pub mod batch;
pub mod config;
pub mod error;
pub mod interactive;
pub mod llm;
pub mod qa;
pub mod scraper;

use std::sync::Arc;

use config::Config;
use error::{AppError, Result};
use qa::QaService;
use scraper::Scraper;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub scraper: Arc<Scraper>,
    /// Service built from the configured key; `None` when no key was configured.
    pub qa: Option<QaService>,
}

impl AppState {
    pub fn new(config: Config, scraper: Scraper, qa: Option<QaService>) -> Self {
        Self {
            config: Arc::new(config),
            scraper: Arc::new(scraper),
            qa,
        }
    }

    /// Build state from loaded config. A missing API key is not fatal here;
    /// requests may still supply their own.
    pub fn from_config(config: Config) -> Result<Self> {
        let scraper = Scraper::with_timeout(config.fetch_timeout)?;
        let qa = match QaService::with_resolver(None, &config.llm, |_| {
            config.openai_api_key.clone()
        }) {
            Ok(qa) => Some(qa),
            Err(AppError::MissingCredential) => None,
            Err(e) => return Err(e),
        };
        Ok(Self::new(config, scraper, qa))
    }

    /// The service to use for one request: a per-request key wins over the
    /// configured one.
    pub fn qa_for(&self, api_key: Option<&str>) -> Result<QaService> {
        match api_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => QaService::with_resolver(Some(key), &self.config.llm, |_| None),
            None => self.qa.clone().ok_or(AppError::MissingCredential),
        }
    }
}

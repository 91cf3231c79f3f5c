//! Application configuration with layered loading.
//!
//! Loading precedence (highest wins):
//! 1. Environment variables (`STARGAZE_*`), with `GITHUB_TOKEN` as a token fallback
//! 2. TOML config file (if `STARGAZE_CONFIG_FILE` is set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StargazeError};
use crate::state::{DEFAULT_PAGE_SIZE, DEFAULT_QUERY};

/// GitHub caps connection page sizes at 100.
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// GitHub token sent as a bearer credential.
    ///
    /// Set via STARGAZE_TOKEN, or GITHUB_TOKEN when that is unset.
    #[serde(default)]
    pub token: Option<String>,

    /// GraphQL endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Repositories per search page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Search string used when none is given.
    #[serde(default = "default_query")]
    pub default_query: String,
}

fn default_endpoint() -> String {
    "https://api.github.com/graphql".into()
}

fn default_user_agent() -> String {
    "stargaze/0.1".into()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_query() -> String {
    DEFAULT_QUERY.into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            token: None,
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            page_size: default_page_size(),
            default_query: default_query(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources and validate it.
    pub fn load() -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("STARGAZE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(Env::prefixed("STARGAZE_").map(|key| key.as_str().to_lowercase().into()));

        let mut config: Self = figment
            .extract()
            .map_err(|e| StargazeError::Config(e.to_string()))?;

        // An empty token from any layer counts as unset.
        config.token = config
            .token
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()));

        config.validate()?;
        Ok(config)
    }

    /// Token, or `MissingToken` when none was configured.
    pub fn require_token(&self) -> Result<&str> {
        self.token.as_deref().ok_or(StargazeError::MissingToken)
    }

    /// Validate configuration values after loading.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(invalid("page_size", format!("must be between 1 and {}", MAX_PAGE_SIZE)));
        }
        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(invalid("endpoint", "must be an http(s) URL"));
        }
        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        if self.default_query.trim().is_empty() {
            return Err(invalid("default_query", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> StargazeError {
    StargazeError::InvalidConfig {
        field: field.into(),
        reason: reason.into(),
    }
}

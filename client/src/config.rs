use std::env;
use std::time::Duration;

use shared::config::DEFAULT_API_BASE_URL;

use crate::error::{ClientError, ClientResult};

pub const API_KEY_VAR: &str = "ORS_API_KEY";
pub const BASE_URL_VAR: &str = "ORS_API_BASE_URL";
pub const TIMEOUT_VAR: &str = "ORS_TIMEOUT_SECS";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Reads `ORS_API_KEY` (required), `ORS_API_BASE_URL` and `ORS_TIMEOUT_SECS`.
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClientResult<Self> {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ClientError::config(format!("{API_KEY_VAR} is not set")))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup(BASE_URL_VAR).filter(|url| !url.is_empty()) {
            config.base_url = base_url;
        }
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ClientError::config(format!("{TIMEOUT_VAR} must be whole seconds, got {raw:?}")))?;
            config.timeout = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ClientResult<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::config(format!(
                "base URL must start with http:// or https://, got {}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::config("timeout must be positive"));
        }
        Ok(())
    }
}

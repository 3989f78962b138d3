use repu_error::{RepuError, Result, REQUEST_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the API base address.
pub const BASE_URL_ENV: &str = "REPU_API_BASE_URL";

/// Fixed per-request timeout of the shared transport.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(REQUEST_TIMEOUT_MS);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String, // e.g. http://localhost:8080
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(RepuError::Configuration {
                key: BASE_URL_ENV.to_string(),
                reason: "empty base url".to_string(),
            });
        }
        Ok(Self { base_url })
    }

    pub fn from_env() -> Result<Self> {
        let raw = std::env::var(BASE_URL_ENV).map_err(|_| RepuError::Configuration {
            key: BASE_URL_ENV.to_string(),
            reason: "not set".to_string(),
        })?;
        Self::new(raw)
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

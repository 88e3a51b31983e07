//! Remote API and request pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

const fn default_read_timeout_secs() -> u64 {
    30
}

const fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("fieldops/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base endpoint every request path is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Time allowed to establish a connection.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Time allowed between reads of the response.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    /// Time allowed for the whole request, headers to last body byte.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(ConfigError::invalid("api.base_url", "must not be empty"));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "api.base_url",
                format!("expected an http(s) URL, got '{base}'"),
            ));
        }
        for (field, value) in [
            ("api.connect_timeout_secs", self.connect_timeout_secs),
            ("api.read_timeout_secs", self.read_timeout_secs),
            ("api.request_timeout_secs", self.request_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be greater than zero"));
            }
        }
        Ok(())
    }
}

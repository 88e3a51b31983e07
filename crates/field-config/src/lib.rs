//! # field-config
//!
//! Layered configuration loading for fieldops using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`FIELDOPS_*` prefix, `__` as separator)
//! 2. Externally supplied overrides ([`FieldConfig::load_with_env_overrides`])
//! 3. Project-level `.fieldops/config.toml`
//! 4. User-level `~/.config/fieldops/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `FIELDOPS_API__BASE_URL` -> `api.base_url`,
//! `FIELDOPS_CREDENTIALS__BACKEND` -> `credentials.backend`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use field_config::FieldConfig;
//!
//! let config = FieldConfig::load_with_dotenv().expect("config");
//! println!("API: {}", config.api.base_url());
//! ```

mod api;
mod credentials;
mod error;
mod session;

pub use api::ApiConfig;
pub use credentials::{CredentialBackend, CredentialConfig};
pub use error::ConfigError;
pub use session::{DEFAULT_INVALIDATION_CODES, SessionConfig};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const ENV_PREFIX: &str = "FIELDOPS_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FieldConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl FieldConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`load_with_dotenv`](Self::load_with_dotenv)
    /// if you need `.env` file loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::extract(Self::figment())
    }

    /// Load configuration with `.env` file support.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Load configuration with extra `FIELDOPS_*`-style key/value pairs layered
    /// beneath the process environment.
    ///
    /// Keys without the `FIELDOPS_` prefix are ignored.
    pub fn load_with_env_overrides(overrides: &[(String, String)]) -> Result<Self, ConfigError> {
        let mut figment = Self::file_figment();
        for (key, value) in overrides {
            let Some(path) = env_key_to_path(key) else {
                continue;
            };
            let parsed: Value = value.parse().unwrap_or_else(|_| Value::from(value.clone()));
            figment = figment.merge(Serialized::default(&path, parsed));
        }
        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or layer more
    /// providers on top.
    pub fn figment() -> Figment {
        Self::file_figment().merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Check values that deserialize fine but cannot work at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate()
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn file_figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = PathBuf::from(".fieldops/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("fieldops").join("config.toml"))
    }
}

/// `FIELDOPS_API__BASE_URL` -> `api.base_url`.
fn env_key_to_path(key: &str) -> Option<String> {
    let rest = key.strip_prefix(ENV_PREFIX)?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_ascii_lowercase().replace("__", "."))
}

//! Credential storage configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the bearer credential is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialBackend {
    /// OS keychain, falling back to the credentials file.
    #[default]
    Keyring,
    /// Plain file with owner-only permissions.
    File,
    /// Process memory only; nothing survives a restart.
    Memory,
}

fn default_keyring_service() -> String {
    "fieldops".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialConfig {
    #[serde(default)]
    pub backend: CredentialBackend,

    /// Keyring service name. Tests override this to avoid touching real entries.
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Credentials file. Defaults to `~/.fieldops/credentials`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            backend: CredentialBackend::default(),
            keyring_service: default_keyring_service(),
            file_path: None,
        }
    }
}

impl CredentialConfig {
    /// Resolved credentials file path, if one can be determined.
    #[must_use]
    pub fn resolved_file_path(&self) -> Option<PathBuf> {
        self.file_path
            .clone()
            .or_else(|| dirs::home_dir().map(|h| h.join(".fieldops").join("credentials")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_keyring() {
        let config = CredentialConfig::default();
        assert_eq!(config.backend, CredentialBackend::Keyring);
        assert_eq!(config.keyring_service, "fieldops");
    }

    #[test]
    fn explicit_file_path_wins() {
        let config = CredentialConfig {
            file_path: Some(PathBuf::from("/tmp/fieldops-creds")),
            ..Default::default()
        };
        assert_eq!(
            config.resolved_file_path(),
            Some(PathBuf::from("/tmp/fieldops-creds"))
        );
    }
}

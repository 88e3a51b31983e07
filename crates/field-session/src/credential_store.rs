//! Durable storage for the single bearer credential.
//!
//! Every read goes to the backing store; nothing is cached, so a `save` or
//! `clear` is visible to the very next `get`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use field_config::{CredentialBackend, CredentialConfig};

use crate::error::CredentialError;

const KEYRING_USER: &str = "bearer-token";

/// Key-value box holding at most one credential.
pub trait CredentialStore: Send + Sync {
    /// Replace the stored credential.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if the token is empty or cannot be persisted.
    fn save(&self, token: &str) -> Result<(), CredentialError>;

    /// Current credential, `None` when logged out.
    fn get(&self) -> Option<String>;

    fn has(&self) -> bool {
        self.get().is_some()
    }

    /// Erase the credential. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if the backing store cannot be updated.
    fn clear(&self) -> Result<(), CredentialError>;

    /// Short backend name for status display.
    fn backend(&self) -> &'static str;
}

/// Build the store selected by configuration.
///
/// # Errors
///
/// Returns [`CredentialError::NoLocation`] when a file-backed store is
/// requested and no credentials path can be resolved.
pub fn open_store(config: &CredentialConfig) -> Result<Arc<dyn CredentialStore>, CredentialError> {
    match config.backend {
        CredentialBackend::Memory => Ok(Arc::new(MemoryCredentialStore::default())),
        CredentialBackend::File => {
            let path = config
                .resolved_file_path()
                .ok_or(CredentialError::NoLocation)?;
            Ok(Arc::new(FileCredentialStore::new(path)))
        }
        CredentialBackend::Keyring => {
            let path = config
                .resolved_file_path()
                .ok_or(CredentialError::NoLocation)?;
            Ok(Arc::new(KeyringCredentialStore::new(
                &config.keyring_service,
                FileCredentialStore::new(path),
            )))
        }
    }
}

fn normalize(token: &str) -> Option<&str> {
    let trimmed = token.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

// --- Keyring ---

/// One secret held by a platform secret service.
pub trait SecretSlot: Send + Sync {
    /// Stored secret, `None` when absent or unreadable.
    fn read(&self) -> Option<String>;

    /// # Errors
    ///
    /// Returns the service's error text when the write is refused.
    fn write(&self, secret: &str) -> Result<(), String>;

    /// Remove the secret. Removing an absent secret succeeds.
    ///
    /// # Errors
    ///
    /// Returns the service's error text when the entry cannot be deleted.
    fn delete(&self) -> Result<(), String>;
}

/// The OS keychain entry `(service, "bearer-token")`.
pub struct OsKeyring {
    service: String,
}

impl OsKeyring {
    #[must_use]
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, keyring::Error> {
        keyring::Entry::new(&self.service, KEYRING_USER)
    }
}

impl SecretSlot for OsKeyring {
    fn read(&self) -> Option<String> {
        let token = self.entry().ok()?.get_password().ok()?;
        normalize(&token).map(str::to_string)
    }

    fn write(&self, secret: &str) -> Result<(), String> {
        let entry = self.entry().map_err(|e| e.to_string())?;
        entry.set_password(secret).map_err(|e| e.to_string())
    }

    fn delete(&self) -> Result<(), String> {
        let entry = self.entry().map_err(|e| e.to_string())?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(error.to_string()),
        }
    }
}

/// Keychain-backed store with a file fallback for hosts without a usable
/// keychain.
///
/// A credential is only ever visible from one of the two places: a keychain
/// entry that cannot be removed fails the operation instead of shadowing
/// the file.
pub struct KeyringCredentialStore<S = OsKeyring> {
    slot: S,
    fallback: FileCredentialStore,
}

impl KeyringCredentialStore {
    #[must_use]
    pub fn new(service: &str, fallback: FileCredentialStore) -> Self {
        Self::with_slot(OsKeyring::new(service), fallback)
    }
}

impl<S: SecretSlot> KeyringCredentialStore<S> {
    pub const fn with_slot(slot: S, fallback: FileCredentialStore) -> Self {
        Self { slot, fallback }
    }

    fn write_keyring(&self, token: &str) -> Result<(), String> {
        self.slot.write(token)?;
        // Some platforms accept writes into a store that does not persist.
        if self.slot.read().as_deref() == Some(token) {
            Ok(())
        } else {
            Err("keyring did not retain the credential".to_string())
        }
    }

    /// Remove the keychain entry. Fails only if a credential is still
    /// readable afterwards.
    fn discard_keyring(&self) -> Result<(), CredentialError> {
        let Err(error) = self.slot.delete() else {
            return Ok(());
        };
        if self.slot.read().is_some() {
            return Err(CredentialError::Keyring(format!(
                "stored credential could not be removed: {error}"
            )));
        }
        tracing::debug!(%error, "keyring delete failed on an empty entry");
        Ok(())
    }
}

impl<S: SecretSlot> CredentialStore for KeyringCredentialStore<S> {
    fn save(&self, token: &str) -> Result<(), CredentialError> {
        let token = normalize(token).ok_or(CredentialError::EmptyToken)?;
        match self.write_keyring(token) {
            Ok(()) => {
                if let Err(error) = self.fallback.clear() {
                    tracing::warn!(%error, "failed to remove stale credentials file");
                }
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, "keyring store failed; falling back to file");
                self.discard_keyring()?;
                self.fallback.save(token)
            }
        }
    }

    fn get(&self) -> Option<String> {
        self.slot.read().or_else(|| self.fallback.get())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        let keyring = self.discard_keyring();
        let file = self.fallback.clear();
        keyring.and(file)
    }

    fn backend(&self) -> &'static str {
        if self.slot.read().is_some() {
            "keyring"
        } else {
            "file"
        }
    }
}

// --- File ---

/// Single credentials file, owner-only permissions on Unix.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, token: &str) -> Result<(), CredentialError> {
        let token = normalize(token).ok_or(CredentialError::EmptyToken)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CredentialError::File(format!("mkdir {}: {e}", parent.display())))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
                }
            }
        }
        fs::write(&self.path, token)
            .map_err(|e| CredentialError::File(format!("write {}: {e}", self.path.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                CredentialError::File(format!("chmod {}: {e}", self.path.display()))
            })?;
        }

        Ok(())
    }

    fn get(&self) -> Option<String> {
        let content = fs::read_to_string(&self.path).ok()?;
        normalize(&content).map(str::to_string)
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CredentialError::File(format!(
                "delete {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

// --- Memory ---

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(normalize(token).map(str::to_string)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, token: &str) -> Result<(), CredentialError> {
        let token = normalize(token).ok_or(CredentialError::EmptyToken)?;
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn get(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) -> Result<(), CredentialError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file_store(dir: &tempfile::TempDir) -> FileCredentialStore {
        FileCredentialStore::new(dir.path().join("nested").join("credentials"))
    }

    #[test]
    fn file_save_get_clear_cycle() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = file_store(&tmp);

        assert!(!store.has());
        store.save("tok_abc123").expect("save");
        assert_eq!(store.get().as_deref(), Some("tok_abc123"));
        assert!(store.has());

        store.clear().expect("clear");
        assert_eq!(store.get(), None);
        assert!(!store.has());
        assert!(!store.path().exists());
    }

    #[test]
    fn file_save_replaces_previous_token() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = file_store(&tmp);

        store.save("first").expect("save");
        store.save("second").expect("save");
        assert_eq!(store.get().as_deref(), Some("second"));
    }

    #[test]
    fn file_clear_is_idempotent() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = file_store(&tmp);
        store.clear().expect("clear on empty");
        store.clear().expect("clear twice");
    }

    #[test]
    fn file_reads_reflect_external_changes() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = file_store(&tmp);
        store.save("original").expect("save");

        std::fs::write(store.path(), "rotated").expect("external write");
        assert_eq!(store.get().as_deref(), Some("rotated"));

        std::fs::remove_file(store.path()).expect("external wipe");
        assert!(!store.has());
    }

    #[cfg(unix)]
    #[test]
    fn file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = file_store(&tmp);
        store.save("secret").expect("save");

        let mode = std::fs::metadata(store.path())
            .expect("metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600, "credentials file should be 0600");
    }

    #[test]
    fn whitespace_content_is_absent() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = file_store(&tmp);
        std::fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
        std::fs::write(store.path(), "   \n  ").expect("write");
        assert!(store.get().is_none(), "whitespace-only should return None");
    }

    #[test]
    fn empty_token_is_rejected() {
        let store = MemoryCredentialStore::default();
        assert!(matches!(store.save("  "), Err(CredentialError::EmptyToken)));
        assert!(!store.has());
    }

    #[test]
    fn memory_save_get_clear_cycle() {
        let store = MemoryCredentialStore::default();
        store.save("tok").expect("save");
        assert_eq!(store.get().as_deref(), Some("tok"));
        store.clear().expect("clear");
        assert_eq!(store.get(), None);
        assert!(!store.has());
    }

    /// Keychain double whose writes and deletes can be made to fail.
    #[derive(Default)]
    struct FlakySlot {
        secret: Mutex<Option<String>>,
        refuse_writes: bool,
        refuse_deletes: bool,
    }

    impl FlakySlot {
        fn holding(secret: &str) -> Self {
            Self {
                secret: Mutex::new(Some(secret.to_string())),
                ..Self::default()
            }
        }
    }

    impl SecretSlot for FlakySlot {
        fn read(&self) -> Option<String> {
            self.secret.lock().unwrap().clone()
        }

        fn write(&self, secret: &str) -> Result<(), String> {
            if self.refuse_writes {
                return Err("keychain locked".into());
            }
            *self.secret.lock().unwrap() = Some(secret.to_string());
            Ok(())
        }

        fn delete(&self) -> Result<(), String> {
            if self.refuse_deletes {
                return Err("keychain locked".into());
            }
            *self.secret.lock().unwrap() = None;
            Ok(())
        }
    }

    fn keyring_store(
        slot: FlakySlot,
        tmp: &tempfile::TempDir,
    ) -> KeyringCredentialStore<FlakySlot> {
        KeyringCredentialStore::with_slot(slot, file_store(tmp))
    }

    #[test]
    fn keyring_save_prefers_keychain_and_drops_file() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = keyring_store(FlakySlot::default(), &tmp);
        store.fallback.save("from-file").expect("seed file");

        store.save("from-keychain").expect("save");
        assert_eq!(store.get().as_deref(), Some("from-keychain"));
        assert_eq!(store.backend(), "keyring");
        assert!(!store.fallback.path().exists());
    }

    #[test]
    fn keyring_clear_reports_undeletable_entry() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = keyring_store(
            FlakySlot {
                refuse_deletes: true,
                ..FlakySlot::holding("old")
            },
            &tmp,
        );
        store.fallback.save("old-file").expect("seed file");

        assert!(matches!(store.clear(), Err(CredentialError::Keyring(_))));
        assert!(!store.fallback.path().exists(), "file is cleared regardless");
    }

    #[test]
    fn keyring_clear_tolerates_unavailable_keychain() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = keyring_store(
            FlakySlot {
                refuse_deletes: true,
                ..FlakySlot::default()
            },
            &tmp,
        );
        store.fallback.save("only-file").expect("seed file");

        store.clear().expect("nothing left in the keychain");
        assert_eq!(store.get(), None);
    }

    #[test]
    fn keyring_fallback_save_removes_stale_keychain_token() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = keyring_store(
            FlakySlot {
                refuse_writes: true,
                ..FlakySlot::holding("old")
            },
            &tmp,
        );

        store.save("new").expect("save to file");
        assert_eq!(store.get().as_deref(), Some("new"));
        assert_eq!(store.backend(), "file");
    }

    #[test]
    fn keyring_save_fails_when_stale_token_cannot_be_removed() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = keyring_store(
            FlakySlot {
                refuse_writes: true,
                refuse_deletes: true,
                ..FlakySlot::holding("old")
            },
            &tmp,
        );

        assert!(matches!(store.save("new"), Err(CredentialError::Keyring(_))));
        assert!(!store.fallback.path().exists());
    }

    #[test]
    fn open_store_honours_backend() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let memory = open_store(&CredentialConfig {
            backend: CredentialBackend::Memory,
            ..Default::default()
        })
        .expect("memory store");
        assert_eq!(memory.backend(), "memory");

        let file = open_store(&CredentialConfig {
            backend: CredentialBackend::File,
            file_path: Some(tmp.path().join("credentials")),
            ..Default::default()
        })
        .expect("file store");
        file.save("persisted").expect("save");
        assert_eq!(file.backend(), "file");
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("credentials")).expect("read"),
            "persisted"
        );
    }
}

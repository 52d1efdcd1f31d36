//! Persistent storage for the single bearer token.
//!
//! Every backend keeps exactly one value under a fixed key. Writes overwrite,
//! clears of a missing value succeed, and blank values read back as absent.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

/// Fixed storage key for the token
pub const TOKEN_KEY: &str = "authToken";

/// Keychain service name
const SERVICE_NAME: &str = "careerchamp";

pub trait TokenStore: Send + Sync {
    /// Persist the token, replacing any previous value.
    fn save(&self, token: &str) -> Result<()>;

    /// Return the stored token, if any.
    fn load(&self) -> Result<Option<String>>;

    /// Remove the stored token.
    fn clear(&self) -> Result<()>;
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

// ============================================================================
// File
// ============================================================================

/// Token kept in a plain file inside the cache directory.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store the token as `<dir>/authToken`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(TOKEN_KEY),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create token directory")?;
        }
        std::fs::write(&self.path, token).context("Failed to write token file")?;
        debug!(path = ?self.path, "Token saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(non_blank(contents.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("Failed to read token file"),
        }
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = ?self.path, "Token file removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove token file"),
        }
    }
}

// ============================================================================
// OS keychain
// ============================================================================

/// Token kept in the OS keychain.
///
/// One `Entry` is held for the store's lifetime so every call talks to the
/// same credential.
pub struct KeyringTokenStore {
    entry: Entry,
}

impl KeyringTokenStore {
    pub fn new() -> Result<Self> {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: &str) -> Result<Self> {
        let entry = Entry::new(service, TOKEN_KEY).context("Failed to create keyring entry")?;
        Ok(Self { entry })
    }
}

impl TokenStore for KeyringTokenStore {
    fn save(&self, token: &str) -> Result<()> {
        self.entry
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn load(&self) -> Result<Option<String>> {
        match self.entry.get_password() {
            Ok(token) => Ok(non_blank(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn clear(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local token, gone when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn load(&self) -> Result<Option<String>> {
        let token = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(token.clone().and_then(non_blank))
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested"));

        assert_eq!(store.load().unwrap(), None);
        store.save("first").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("first"));

        store.save("second").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("second"));
        assert!(store.path().ends_with(TOKEN_KEY));
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());

        store.clear().unwrap();
        store.save("token").unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_blank_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());
        std::fs::write(store.path(), "  \n").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().unwrap(), None);

        store.save("abc").unwrap();
        store.save("abc").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);

        let seeded = MemoryTokenStore::with_token("seed");
        assert_eq!(seeded.load().unwrap().as_deref(), Some("seed"));
    }

    #[test]
    fn test_keyring_store_round_trip() {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        let store = KeyringTokenStore::with_service("careerchamp-test").unwrap();

        assert_eq!(store.load().unwrap(), None);
        store.save("abc.def.ghi").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc.def.ghi"));

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    #[ignore = "needs an unlocked OS keychain"]
    fn test_keyring_store_persists_across_instances() {
        let service = "careerchamp-keychain-test";
        KeyringTokenStore::with_service(service).unwrap().save("persisted").unwrap();

        let reopened = KeyringTokenStore::with_service(service).unwrap();
        assert_eq!(reopened.load().unwrap().as_deref(), Some("persisted"));
        reopened.clear().unwrap();
    }
}

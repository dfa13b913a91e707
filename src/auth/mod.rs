//! Per-driver credentials and their storage.
//!
//! Drivers never touch persistence directly: each one is handed an
//! `Arc<dyn CredentialStore>` at construction and keys everything by its own
//! name. [`FileCredentialStore`] is the persisted, encrypted-at-rest backend;
//! [`MemoryCredentialStore`] keeps credentials for the lifetime of the process.

mod storage;

use std::collections::HashMap;
use std::sync::Mutex;

pub use storage::{FileCredentialStore, StorageError, persisted_credential_path};

/// Login material for one driver.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Credential {
    /// Account identifier on the host.
    pub login: String,
    secret: String,
}

impl Credential {
    /// Creates a credential.
    #[must_use]
    pub fn new(login: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            secret: secret.into(),
        }
    }

    /// Password, API key, or session token stored for the host.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("login", &self.login)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Storage contract drivers use for their credentials.
///
/// Implementations must tolerate `erase` on a missing entry.
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
    /// Returns true when a credential is stored for `driver`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing store cannot be read.
    fn exists(&self, driver: &str) -> Result<bool, StorageError>;

    /// Loads the credential stored for `driver`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing store cannot be read.
    fn load(&self, driver: &str) -> Result<Option<Credential>, StorageError>;

    /// Stores (or replaces) the credential for `driver`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing store cannot be written.
    fn save(&self, driver: &str, credential: &Credential) -> Result<(), StorageError>;

    /// Removes the credential for `driver`, returning whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing store cannot be written.
    fn erase(&self, driver: &str) -> Result<bool, StorageError>;
}

/// In-process credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, Credential>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Credential>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn exists(&self, driver: &str) -> Result<bool, StorageError> {
        Ok(self.entries().contains_key(driver))
    }

    fn load(&self, driver: &str) -> Result<Option<Credential>, StorageError> {
        Ok(self.entries().get(driver).cloned())
    }

    fn save(&self, driver: &str, credential: &Credential) -> Result<(), StorageError> {
        self.entries()
            .insert(driver.to_string(), credential.clone());
        Ok(())
    }

    fn erase(&self, driver: &str) -> Result<bool, StorageError> {
        Ok(self.entries().remove(driver).is_some())
    }
}

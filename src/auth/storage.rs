//! Encrypted-at-rest credential persistence.
//!
//! Credentials for every driver live in one file, by default
//! `~/.config/hostdl/credentials.enc` (or `$XDG_CONFIG_HOME/hostdl/credentials.enc`).
//! The payload is a JSON map `driver name -> credential`, sealed with
//! XChaCha20-Poly1305 under a key taken from `HOSTDL_MASTER_KEY` or the
//! system keychain.

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::{Credential, CredentialStore};

const CREDENTIAL_FILE_NAME: &str = "credentials.enc";
const MASTER_KEY_ENV: &str = "HOSTDL_MASTER_KEY";
const KEYRING_SERVICE: &str = "hostdl";
const KEYRING_ENTRY_NAME: &str = "credential-master-key-v1";
const MAGIC: &[u8; 4] = b"HDC1";
const NONCE_LEN: usize = 24;
const KEY_LEN: usize = 32;

/// Errors for persisted credential storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No suitable user config directory is available.
    #[error("unable to determine config directory (set XDG_CONFIG_HOME or HOME)")]
    ConfigDirUnavailable,
    /// Filesystem I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Could not access keychain and no env fallback key was provided.
    #[error(
        "unable to access system keychain for credential encryption key; set HOSTDL_MASTER_KEY or configure keychain access"
    )]
    KeychainUnavailable,
    /// Stored encrypted payload is malformed.
    #[error("persisted credential payload is invalid")]
    InvalidPayload,
    /// Encryption failed.
    #[error("failed to encrypt persisted credentials")]
    EncryptionFailed,
    /// Decryption failed.
    #[error("failed to decrypt persisted credentials")]
    DecryptionFailed,
}

type CredentialMap = BTreeMap<String, Credential>;

/// Credential store backed by a single encrypted file.
pub struct FileCredentialStore {
    path: PathBuf,
    key_material: OnceLock<String>,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for FileCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCredentialStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Returns the default persisted credential path.
///
/// # Errors
///
/// Returns [`StorageError::ConfigDirUnavailable`] if no usable config dir is found.
pub fn persisted_credential_path() -> Result<PathBuf, StorageError> {
    Ok(default_config_dir()?.join(CREDENTIAL_FILE_NAME))
}

impl FileCredentialStore {
    /// Opens the store at the default location.
    ///
    /// The encryption key is resolved lazily, so erasing from a store whose
    /// file does not exist never touches the keychain.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ConfigDirUnavailable`] if no usable config dir is found.
    pub fn open_default() -> Result<Self, StorageError> {
        Ok(Self {
            path: persisted_credential_path()?,
            key_material: OnceLock::new(),
            write_lock: Mutex::new(()),
        })
    }

    /// Opens a store at `path` sealed with explicit key material.
    #[must_use]
    pub fn with_key(path: impl Into<PathBuf>, key_material: impl Into<String>) -> Self {
        let key = OnceLock::new();
        let _ = key.set(key_material.into());
        Self {
            path: path.into(),
            key_material: key,
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the encrypted file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn key(&self) -> Result<&str, StorageError> {
        if let Some(key) = self.key_material.get() {
            return Ok(key.as_str());
        }
        let loaded = load_or_create_key()?;
        Ok(self.key_material.get_or_init(|| loaded).as_str())
    }

    fn read_map(&self) -> Result<CredentialMap, StorageError> {
        if !self.path.exists() {
            return Ok(CredentialMap::new());
        }
        load_credentials_with_key(&self.path, self.key()?)
    }

    fn write_map(&self, map: &CredentialMap) -> Result<(), StorageError> {
        if map.is_empty() {
            if self.path.exists() {
                fs::remove_file(&self.path)?;
            }
            return Ok(());
        }
        store_credentials_with_key(map, &self.path, self.key()?)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CredentialStore for FileCredentialStore {
    fn exists(&self, driver: &str) -> Result<bool, StorageError> {
        Ok(self.read_map()?.contains_key(driver))
    }

    fn load(&self, driver: &str) -> Result<Option<Credential>, StorageError> {
        Ok(self.read_map()?.remove(driver))
    }

    fn save(&self, driver: &str, credential: &Credential) -> Result<(), StorageError> {
        let _guard = self.lock();
        let mut map = self.read_map()?;
        map.insert(driver.to_string(), credential.clone());
        self.write_map(&map)?;
        debug!(driver, path = %self.path.display(), "Saved credential");
        Ok(())
    }

    fn erase(&self, driver: &str) -> Result<bool, StorageError> {
        let _guard = self.lock();
        if !self.path.exists() {
            return Ok(false);
        }
        let mut map = self.read_map()?;
        let removed = map.remove(driver).is_some();
        if removed {
            self.write_map(&map)?;
            debug!(driver, "Erased credential");
        }
        Ok(removed)
    }
}

fn default_config_dir() -> Result<PathBuf, StorageError> {
    resolve_config_dir(
        sanitize_env_path(env::var_os("XDG_CONFIG_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("APPDATA")),
    )
}

fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }

    Some(PathBuf::from(value))
}

fn resolve_config_dir(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
) -> Result<PathBuf, StorageError> {
    if let Some(xdg) = xdg_config_home {
        return Ok(xdg.join("hostdl"));
    }
    if let Some(home) = home {
        return Ok(home.join(".config").join("hostdl"));
    }
    if let Some(app_data) = app_data {
        return Ok(app_data.join("hostdl"));
    }

    Err(StorageError::ConfigDirUnavailable)
}

fn load_or_create_key() -> Result<String, StorageError> {
    if let Some(from_env) = env::var_os(MASTER_KEY_ENV) {
        let key = from_env.to_string_lossy().trim().to_string();
        if !key.is_empty() {
            return Ok(key);
        }
    }

    let entry = safe_keyring_entry()?;

    if let Some(existing) = safe_keyring_get_password(&entry)? {
        return Ok(existing);
    }

    let generated = generate_key_material();
    safe_keyring_set_password(&entry, &generated)?;
    Ok(generated)
}

/// `Ok(None)` only for a missing or blank entry; those are safe to replace.
fn stored_key(result: keyring::Result<String>) -> Result<Option<String>, StorageError> {
    match result {
        Ok(existing) if !existing.trim().is_empty() => Ok(Some(existing)),
        Ok(_) | Err(keyring::Error::NoEntry) => Ok(None),
        Err(error) => {
            warn!(%error, "Keychain read failed");
            Err(StorageError::KeychainUnavailable)
        }
    }
}

// Some keychain backends panic when no session bus is available.
fn safe_keyring_entry() -> Result<keyring::Entry, StorageError> {
    catch_unwind(|| keyring::Entry::new(KEYRING_SERVICE, KEYRING_ENTRY_NAME))
        .map_err(|_| StorageError::KeychainUnavailable)?
        .map_err(|_| StorageError::KeychainUnavailable)
}

fn safe_keyring_get_password(entry: &keyring::Entry) -> Result<Option<String>, StorageError> {
    catch_unwind(AssertUnwindSafe(|| entry.get_password()))
        .map_err(|_| StorageError::KeychainUnavailable)
        .and_then(stored_key)
}

fn safe_keyring_set_password(entry: &keyring::Entry, password: &str) -> Result<(), StorageError> {
    catch_unwind(AssertUnwindSafe(|| entry.set_password(password)))
        .map_err(|_| StorageError::KeychainUnavailable)?
        .map_err(|_| StorageError::KeychainUnavailable)
}

fn generate_key_material() -> String {
    let mut bytes = [0_u8; KEY_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn derive_key_bytes(key_material: &str) -> [u8; KEY_LEN] {
    let digest = Sha256::digest(key_material.as_bytes());
    let mut key = [0_u8; KEY_LEN];
    key.copy_from_slice(&digest[..KEY_LEN]);
    key
}

fn store_credentials_with_key(
    credentials: &CredentialMap,
    path: &Path,
    key_material: &str,
) -> Result<(), StorageError> {
    let plaintext = serde_json::to_vec(credentials)?;
    let encrypted = encrypt_bytes(&plaintext, key_material)?;
    write_encrypted_payload(path, &encrypted)
}

fn write_encrypted_payload(path: &Path, payload: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, payload)?;
    set_owner_only_permissions(path)?;
    Ok(())
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<(), StorageError> {
    Ok(())
}

fn load_credentials_with_key(path: &Path, key_material: &str) -> Result<CredentialMap, StorageError> {
    let bytes = fs::read(path)?;
    let plaintext = decrypt_bytes(&bytes, key_material)?;
    Ok(serde_json::from_slice::<CredentialMap>(&plaintext)?)
}

fn encrypt_bytes(plaintext: &[u8], key_material: &str) -> Result<Vec<u8>, StorageError> {
    let key_bytes = derive_key_bytes(key_material);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key_bytes));

    let mut nonce = [0_u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| StorageError::EncryptionFailed)?;

    let mut output = Vec::with_capacity(MAGIC.len() + NONCE_LEN + ciphertext.len());
    output.extend_from_slice(MAGIC);
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

fn decrypt_bytes(payload: &[u8], key_material: &str) -> Result<Vec<u8>, StorageError> {
    if payload.len() < MAGIC.len() + NONCE_LEN || &payload[..MAGIC.len()] != MAGIC {
        return Err(StorageError::InvalidPayload);
    }

    let key_bytes = derive_key_bytes(key_material);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key_bytes));
    let nonce_end = MAGIC.len() + NONCE_LEN;
    let nonce = XNonce::from_slice(&payload[MAGIC.len()..nonce_end]);

    cipher
        .decrypt(nonce, &payload[nonce_end..])
        .map_err(|_| StorageError::DecryptionFailed)
}

//! Encryption key lifecycle.
//!
//! The active key is generated once per device and persisted in a local,
//! non-synced file, or derived from a user secret via Argon2id with a
//! persisted salt. Every codec call reads the key through
//! [`KeyManager::with_key`]; only [`KeyManager::derive_from_secret`] replaces
//! it. Swapping the key does NOT re-encrypt existing ciphertext - callers that
//! want that use the store's explicit rotation operation.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use argon2::{Argon2, Params, Version};
use rand::RngCore;
use tracing::info;
use zeroize::ZeroizeOnDrop;

use crate::error::{CryptoError, Result};

/// File name of the persisted device key (hex, 32 bytes).
pub const KEY_FILE: &str = "device.key";

/// File name of the persisted key-derivation salt (hex, 16 bytes).
pub const SALT_FILE: &str = "kdf.salt";

/// Active key material. Zeroized when replaced or dropped.
#[derive(ZeroizeOnDrop)]
struct ActiveKey([u8; 32]);

/// A key derived from a user secret but not yet installed as the active key.
///
/// Lets callers re-encrypt existing ciphertext under the new key before
/// committing to it. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct DerivedKey([u8; 32]);

impl DerivedKey {
    /// Run `f` with the candidate key. The key never escapes the closure.
    pub fn with<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&[u8; 32]) -> Result<R>,
    {
        f(&self.0)
    }
}

/// Owns the symmetric encryption key for the storage subsystem.
///
/// Cheap to clone; clones share the same active key.
#[derive(Clone)]
pub struct KeyManager {
    key: Arc<RwLock<ActiveKey>>,
    /// Directory holding `device.key` / `kdf.salt`. `None` for ephemeral
    /// managers, whose key and salt never touch disk.
    key_dir: Option<PathBuf>,
    /// In-memory salt cache (sole storage for ephemeral managers).
    salt: Arc<Mutex<Option<[u8; 16]>>>,
}

impl KeyManager {
    /// Open the key manager backed by `dir`, creating the device key on first
    /// use. Subsequent opens return the same key. Failure here is fatal to
    /// the whole storage subsystem.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let key_path = dir.join(KEY_FILE);
        let key = if key_path.exists() {
            read_key_file(&key_path)?
        } else {
            let mut key = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut key);
            fs::write(&key_path, hex::encode(key))
                .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
            info!("Generated new device key at {:?}", key_path);
            key
        };

        Ok(Self {
            key: Arc::new(RwLock::new(ActiveKey(key))),
            key_dir: Some(dir),
            salt: Arc::new(Mutex::new(None)),
        })
    }

    /// Create a key manager with a random key that is never persisted.
    /// Used for in-memory stores and tests.
    pub fn ephemeral() -> Self {
        let mut key = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut key);
        Self {
            key: Arc::new(RwLock::new(ActiveKey(key))),
            key_dir: None,
            salt: Arc::new(Mutex::new(None)),
        }
    }

    /// Replace the active key with one derived from `secret` via Argon2id.
    ///
    /// The salt is generated once and reused, so the same secret always
    /// yields the same key on this device. Existing ciphertext written under
    /// the previous key becomes unreadable until re-encrypted.
    pub fn derive_from_secret(&self, secret: &str) -> Result<()> {
        let candidate = self.derive_candidate(secret)?;
        self.install(candidate)
    }

    /// Derive a key from `secret` without touching the active key.
    pub fn derive_candidate(&self, secret: &str) -> Result<DerivedKey> {
        let salt = self.load_or_create_salt()?;
        Ok(DerivedKey(derive_key(secret, &salt)?))
    }

    /// Make `candidate` the active key.
    pub fn install(&self, candidate: DerivedKey) -> Result<()> {
        let mut guard = self.key.write().map_err(|_| CryptoError::KeyLock)?;
        *guard = ActiveKey(candidate.0);
        info!("Active encryption key replaced by secret-derived key");
        Ok(())
    }

    /// Run `f` with the active key. The key never escapes the closure.
    pub fn with_key<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&[u8; 32]) -> Result<R>,
    {
        let guard = self.key.read().map_err(|_| CryptoError::KeyLock)?;
        f(&guard.0)
    }

    fn load_or_create_salt(&self) -> Result<[u8; 16]> {
        let mut cached = self.salt.lock().map_err(|_| CryptoError::KeyLock)?;
        if let Some(salt) = *cached {
            return Ok(salt);
        }

        let salt = match &self.key_dir {
            Some(dir) => {
                let salt_path = dir.join(SALT_FILE);
                if salt_path.exists() {
                    read_salt_file(&salt_path)?
                } else {
                    let salt = generate_salt();
                    fs::write(&salt_path, hex::encode(salt))?;
                    salt
                }
            }
            None => generate_salt(),
        };

        *cached = Some(salt);
        Ok(salt)
    }
}

/// Argon2id parameters, tuned for interactive on-device use.
fn argon2_params() -> Params {
    Params::new(
        64 * 1024, // m_cost: 64 MiB
        3,         // t_cost
        1,         // p_cost
        Some(32),
    )
    .expect("static Argon2 params are valid")
}

fn derive_key(secret: &str, salt: &[u8; 16]) -> Result<[u8; 32]> {
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, argon2_params());
    let mut out = [0u8; 32];
    argon2
        .hash_password_into(secret.as_bytes(), salt, &mut out)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(out)
}

fn generate_salt() -> [u8; 16] {
    let mut salt = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

fn read_key_file(path: &PathBuf) -> Result<[u8; 32]> {
    let raw = fs::read_to_string(path)?;
    let bytes = hex::decode(raw.trim())
        .map_err(|e| CryptoError::InvalidKey(format!("key file is not hex: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKey("key file is not 32 bytes".into()))
}

fn read_salt_file(path: &PathBuf) -> Result<[u8; 16]> {
    let raw = fs::read_to_string(path)?;
    let bytes = hex::decode(raw.trim())
        .map_err(|e| CryptoError::InvalidKey(format!("salt file is not hex: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKey("salt file is not 16 bytes".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_of(manager: &KeyManager) -> [u8; 32] {
        manager.with_key(|k| Ok(*k)).unwrap()
    }

    #[test]
    fn test_open_creates_then_reuses_key() {
        let dir = tempfile::tempdir().unwrap();

        let first = KeyManager::open(dir.path()).unwrap();
        let second = KeyManager::open(dir.path()).unwrap();

        assert_eq!(key_of(&first), key_of(&second));
        assert!(dir.path().join(KEY_FILE).exists());
    }

    #[test]
    fn test_ephemeral_keys_are_distinct() {
        let a = KeyManager::ephemeral();
        let b = KeyManager::ephemeral();
        assert_ne!(key_of(&a), key_of(&b));
    }

    #[test]
    fn test_derive_is_deterministic_per_device() {
        let dir = tempfile::tempdir().unwrap();

        let manager = KeyManager::open(dir.path()).unwrap();
        let device_key = key_of(&manager);

        manager.derive_from_secret("1234").unwrap();
        let derived_once = key_of(&manager);
        assert_ne!(device_key, derived_once);

        // A fresh manager on the same directory reuses the persisted salt.
        let reopened = KeyManager::open(dir.path()).unwrap();
        reopened.derive_from_secret("1234").unwrap();
        assert_eq!(derived_once, key_of(&reopened));
    }

    #[test]
    fn test_different_secrets_derive_different_keys() {
        let dir = tempfile::tempdir().unwrap();
        let manager = KeyManager::open(dir.path()).unwrap();

        manager.derive_from_secret("1234").unwrap();
        let first = key_of(&manager);

        manager.derive_from_secret("5678").unwrap();
        assert_ne!(first, key_of(&manager));
    }

    #[test]
    fn test_corrupt_key_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(KEY_FILE), "not-hex").unwrap();

        assert!(matches!(
            KeyManager::open(dir.path()),
            Err(CryptoError::InvalidKey(_))
        ));
    }
}

//! Crypto error types.

use thiserror::Error;

/// Errors from key management and record encryption.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key generation or persistence failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// AEAD encryption failed.
    #[error("encryption failed")]
    Encrypt,

    /// AEAD decryption failed (wrong key, or ciphertext corrupted/tampered).
    #[error("decryption failed (wrong key or corrupted ciphertext)")]
    Decrypt,

    /// Key derivation from a user secret failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Persisted key material is malformed.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// The lock guarding the active key was poisoned.
    #[error("key manager lock poisoned")]
    KeyLock,

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Ciphertext is not valid base64.
    #[error("base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// IO error reading or writing key files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

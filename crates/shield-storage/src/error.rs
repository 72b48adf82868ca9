//! Storage error types.

use shield_core::CryptoError;
use thiserror::Error;

/// Errors that can occur in storage operations.
///
/// The facade never swallows these; every failure propagates to the caller,
/// which owns fallback-cache writes and user-visible messaging.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database or key setup failed. Fatal to the storage subsystem for the
    /// session; callers should degrade to fallback-cache-only mode.
    #[error("storage initialization failed: {0}")]
    Init(String),

    /// Encrypting a record or bundle failed.
    #[error("encryption failed: {0}")]
    Encryption(CryptoError),

    /// Key mismatch or corrupted ciphertext. For bulk reads one bad record
    /// fails the entire call.
    #[error("decryption failed: {0}")]
    Decryption(CryptoError),

    /// The underlying store rejected an operation.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (e.g., creating directories).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record violates a data-model invariant.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Malformed or undecryptable import bundle. If the outer bundle fails to
    /// decrypt, nothing is written; a mid-import failure is not rolled back.
    #[error("import failed: {0}")]
    Import(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

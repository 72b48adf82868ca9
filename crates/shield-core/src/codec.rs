//! Record encryption codec.
//!
//! Serializes a value to canonical JSON and encrypts it with
//! XChaCha20-Poly1305 (32-byte key, random 24-byte nonce, 16-byte tag).
//! Ciphertext is deterministic only in plaintext content, never in bytes:
//! each call draws a fresh nonce.
//!
//! Text form (what the store persists):
//!   base64url( nonce (24 bytes) || ciphertext + tag )
//!
//! Live records and export bundles use different AAD strings so a sealed
//! record can never be passed off as a bundle or vice versa.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng as AeadOsRng, Payload},
    XChaCha20Poly1305, XNonce,
};
use serde::{de::DeserializeOwned, Serialize};
use zeroize::Zeroizing;

use crate::error::{CryptoError, Result};

/// AAD for individually sealed records in the live store.
pub const RECORD_AAD: &[u8] = b"ps-record-v1";

/// AAD for the whole-bundle export blob.
pub const BUNDLE_AAD: &[u8] = b"ps-export-v1";

const NONCE_LEN: usize = 24;

/// Serialize `value` as JSON and seal it under `key`.
pub fn seal<T: Serialize>(key: &[u8; 32], value: &T, aad: &[u8]) -> Result<String> {
    let plaintext = Zeroizing::new(serde_json::to_vec(value)?);

    let cipher = XChaCha20Poly1305::new_from_slice(key).map_err(|_| CryptoError::Encrypt)?;
    let nonce = XChaCha20Poly1305::generate_nonce(&mut AeadOsRng);

    let ciphertext = cipher
        .encrypt(&nonce, Payload { msg: &plaintext, aad })
        .map_err(|_| CryptoError::Encrypt)?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(URL_SAFE_NO_PAD.encode(out))
}

/// Open a sealed value produced by [`seal`].
///
/// Fails with [`CryptoError::Decrypt`] on a wrong key or tampered ciphertext,
/// and with a serialization error if the decrypted bytes are not valid JSON
/// for `T`. Errors are never caught here; the storage facade decides policy.
pub fn open_sealed<T: DeserializeOwned>(key: &[u8; 32], sealed: &str, aad: &[u8]) -> Result<T> {
    let data = URL_SAFE_NO_PAD.decode(sealed)?;
    if data.len() < NONCE_LEN {
        return Err(CryptoError::Decrypt);
    }
    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let nonce = XNonce::from_slice(nonce_bytes);

    let cipher = XChaCha20Poly1305::new_from_slice(key).map_err(|_| CryptoError::Decrypt)?;
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(nonce, Payload { msg: ciphertext, aad })
            .map_err(|_| CryptoError::Decrypt)?,
    );

    Ok(serde_json::from_slice(&plaintext)?)
}

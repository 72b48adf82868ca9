//! PanicShield crypto layer - key lifecycle and record encryption.
//!
//! This crate owns the two leaf concerns of the secure storage subsystem:
//!
//! - Key management: a device-bound symmetric key generated once and persisted
//!   locally, optionally replaced by an Argon2id derivation from a user secret
//!   ([`keys::KeyManager`]).
//! - Record encoding: JSON serialization plus XChaCha20-Poly1305 authenticated
//!   encryption ([`codec`]). The codec is stateless given a key and never
//!   persists key material itself.
//!
//! No custom crypto; all primitives come from audited RustCrypto crates, and
//! secret material is zeroized on drop.

pub mod codec;
pub mod error;
pub mod keys;

pub use error::CryptoError;
pub use keys::{DerivedKey, KeyManager};

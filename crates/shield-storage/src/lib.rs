//! PanicShield Storage - encrypted SQLite persistence layer.
//!
//! This crate is the durable half of the secure storage subsystem. It
//! provides:
//!
//! - Four independently keyed collections (emotion logs, panic sessions,
//!   emergency contacts, plain settings) in one transactional database
//! - Per-record encryption at rest via the `shield-core` codec
//! - Whole-bundle encrypted export and at-least-once import
//! - Atomic clear-all and per-collection statistics
//!
//! # Example
//!
//! ```no_run
//! use shield_storage::{models::EmotionRecord, SecureStore};
//!
//! let store = SecureStore::in_memory().unwrap();
//!
//! let id = store
//!     .save_emotion(EmotionRecord {
//!         id: None,
//!         emotion_id: "happy_joyful".to_string(),
//!         intensity: 2,
//!         triggers: vec!["work".to_string()],
//!         notes: None,
//!         suggestion: None,
//!         timestamp: None,
//!     })
//!     .unwrap();
//!
//! let logs = store.get_all_emotions().unwrap();
//! assert_eq!(logs[0].id.as_deref(), Some(id.as_str()));
//! ```

pub mod error;
pub mod models;
mod pool;
pub mod repository;
mod schema;
mod store;

pub use error::{Result, StorageError};
pub use models::{
    EmergencyContact, EmotionRecord, ExportBundle, ImportSummary, PanicSessionRecord,
    SessionOutcome, SettingEntry, StorageStats,
};
pub use pool::ConnectionPool;
pub use schema::SCHEMA_VERSION;
pub use store::SecureStore;

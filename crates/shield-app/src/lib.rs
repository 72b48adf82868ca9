//! PanicShield application layer.
//!
//! Sits on top of the storage facade and owns the durability policy the
//! facade deliberately does not: an unencrypted [`fallback`] cache for
//! degraded-mode recovery, and a [`journal`] that applies the two-tier write
//! policy (primary encrypted write, explicit fallback on failure).

pub mod fallback;
pub mod journal;

pub use fallback::{BackupRecord, FallbackCache};
pub use journal::{EmotionJournal, EmotionStore, Hydration, WriteOutcome};

//! Emotion journal with an explicit two-tier write policy.
//!
//! Tier one is the encrypted facade; tier two is the plain fallback cache.
//! The journal never hides which tier served a request: writes come back as
//! a tagged [`WriteOutcome`] and reads as a tagged [`Hydration`], so the UI
//! can tell the user when it is running degraded.

use shield_storage::models::generate_id;
use shield_storage::{EmotionRecord, SecureStore, StorageError};
use thiserror::Error;
use tracing::warn;

use crate::fallback::{BackupRecord, CacheError, FallbackCache};

/// Seam between the journal and the storage facade.
pub trait EmotionStore {
    fn save_emotion(&self, record: EmotionRecord) -> Result<String, StorageError>;
    fn get_all_emotions(&self) -> Result<Vec<EmotionRecord>, StorageError>;
    fn delete_emotion(&self, id: &str) -> Result<(), StorageError>;
    fn clear_all_data(&self) -> Result<(), StorageError>;
}

impl EmotionStore for SecureStore {
    fn save_emotion(&self, record: EmotionRecord) -> Result<String, StorageError> {
        SecureStore::save_emotion(self, record)
    }

    fn get_all_emotions(&self) -> Result<Vec<EmotionRecord>, StorageError> {
        SecureStore::get_all_emotions(self)
    }

    fn delete_emotion(&self, id: &str) -> Result<(), StorageError> {
        SecureStore::delete_emotion(self, id)
    }

    fn clear_all_data(&self) -> Result<(), StorageError> {
        SecureStore::clear_all_data(self)
    }
}

/// Where a write ended up.
#[derive(Debug)]
pub enum WriteOutcome {
    /// Stored in the encrypted store (and mirrored to the backup list).
    Stored(String),
    /// The encrypted store failed; the record lives only in the unencrypted
    /// fallback cache.
    FellBack { id: String, reason: StorageError },
}

impl WriteOutcome {
    /// The id assigned to the record, whichever tier holds it.
    pub fn id(&self) -> &str {
        match self {
            WriteOutcome::Stored(id) => id,
            WriteOutcome::FellBack { id, .. } => id,
        }
    }
}

/// Where a read came from.
#[derive(Debug)]
pub enum Hydration {
    /// Full records from the encrypted store.
    Primary(Vec<EmotionRecord>),
    /// Minimal records from the fallback cache; the encrypted store was
    /// unreadable.
    Degraded(Vec<BackupRecord>),
}

/// Both tiers failed.
#[derive(Debug, Error)]
#[error("primary store and fallback cache both failed: {primary}; {fallback}")]
pub struct BothTiersFailed {
    pub primary: StorageError,
    pub fallback: CacheError,
}

/// Caller-side journal over the facade plus the fallback cache.
pub struct EmotionJournal<S = SecureStore> {
    store: S,
    cache: FallbackCache,
}

impl<S: EmotionStore> EmotionJournal<S> {
    pub fn new(store: S, cache: FallbackCache) -> Self {
        Self { store, cache }
    }

    /// Log an emotion.
    ///
    /// Primary path: facade save, then a best-effort mirror into the backup
    /// list. Degraded path: when the facade fails, the record is written to
    /// the unencrypted cache alone and the failure is reported in the
    /// outcome, not swallowed. Errors only if both tiers fail.
    pub fn add_log(&self, record: EmotionRecord) -> Result<WriteOutcome, BothTiersFailed> {
        let backup_fields = (
            record.emotion_id.clone(),
            record.intensity,
            record
                .timestamp
                .clone()
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
        );

        match self.store.save_emotion(record) {
            Ok(id) => {
                let (emotion_id, intensity, timestamp) = backup_fields;
                if let Err(e) = self.cache.append(BackupRecord {
                    id: id.clone(),
                    emotion_id,
                    intensity,
                    timestamp,
                }) {
                    // Backup mirror is best effort; the primary write stands.
                    warn!("Backup mirror write failed: {e}");
                }
                Ok(WriteOutcome::Stored(id))
            }
            Err(reason) => {
                warn!("Secure save failed, writing to fallback cache: {reason}");
                let (emotion_id, intensity, timestamp) = backup_fields;
                let id = generate_id("log");
                let backup = BackupRecord {
                    id: id.clone(),
                    emotion_id,
                    intensity,
                    timestamp,
                };
                match self.cache.append(backup) {
                    Ok(()) => Ok(WriteOutcome::FellBack { id, reason }),
                    Err(fallback) => Err(BothTiersFailed {
                        primary: reason,
                        fallback,
                    }),
                }
            }
        }
    }

    /// Load the emotion history, degrading to the cache when the facade
    /// read fails.
    pub fn load_logs(&self) -> Hydration {
        match self.store.get_all_emotions() {
            Ok(records) => Hydration::Primary(records),
            Err(e) => {
                warn!("Secure read failed, hydrating from fallback cache: {e}");
                Hydration::Degraded(self.cache.load())
            }
        }
    }

    /// Remove the most recent log from whichever tiers hold it. Returns the
    /// removed id, if any.
    pub fn undo_last(&self) -> Result<Option<String>, StorageError> {
        match self.store.get_all_emotions() {
            Ok(records) => {
                let Some(last_id) = records.last().and_then(|r| r.id.clone()) else {
                    return Ok(None);
                };
                self.store.delete_emotion(&last_id)?;
                if let Err(e) = self.cache.pop_last() {
                    warn!("Backup mirror pop failed: {e}");
                }
                Ok(Some(last_id))
            }
            Err(e) => {
                warn!("Secure read failed, undoing against fallback cache: {e}");
                let popped = self.cache.pop_last().map_err(|_| e)?;
                Ok(popped.map(|r| r.id))
            }
        }
    }

    /// Clear the history in both tiers. The cache is cleared even when the
    /// facade clear fails, then the facade error propagates.
    pub fn clear(&self) -> Result<(), StorageError> {
        let primary = self.store.clear_all_data();
        if let Err(e) = self.cache.clear() {
            warn!("Fallback cache clear failed: {e}");
        }
        primary
    }
}

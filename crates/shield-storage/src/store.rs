//! Lifecycle facade over key management, encoding, and the record store.
//!
//! [`SecureStore`] exclusively owns the four collections; nothing else holds a
//! reference to the physical database. Writes flow caller -> facade -> codec
//! -> record store; reads flow the reverse. The facade never retries and
//! never swallows errors - on failure the caller decides whether to fall back
//! to its unencrypted cache.

use std::path::PathBuf;

use chrono::Utc;
use directories::ProjectDirs;
use shield_core::codec::{self, BUNDLE_AAD, RECORD_AAD};
use shield_core::KeyManager;
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::models::{
    generate_id, EmergencyContact, EmotionRecord, ExportBundle, ImportSummary,
    PanicSessionRecord, StorageStats, MAX_NOTES_LEN,
};
use crate::pool::ConnectionPool;
use crate::repository::{Collection, RecordsRepo, SettingsRepo};
use crate::schema::SCHEMA_VERSION;

/// The public API surface of the secure storage subsystem.
///
/// Cheap to clone; clones share the connection and the active key.
#[derive(Clone)]
pub struct SecureStore {
    pool: ConnectionPool,
    keys: KeyManager,
    db_path: Option<PathBuf>,
}

impl SecureStore {
    /// Open the store in the default app data directory, creating the
    /// database, the collections, and the device key on first use.
    pub fn open() -> Result<Self> {
        let data_dir = Self::default_data_dir()?;
        Self::open_at(data_dir.join("shield.db"), data_dir)
    }

    /// Open the store at explicit locations.
    pub fn open_at(db_path: impl Into<PathBuf>, key_dir: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Init(e.to_string()))?;
        }

        info!("Opening secure store at: {:?}", db_path);
        let pool = ConnectionPool::new(&db_path).map_err(|e| StorageError::Init(e.to_string()))?;
        let keys = KeyManager::open(key_dir).map_err(|e| StorageError::Init(e.to_string()))?;

        Ok(Self {
            pool,
            keys,
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory store with an ephemeral key (tests, previews).
    pub fn in_memory() -> Result<Self> {
        let pool = ConnectionPool::in_memory().map_err(|e| StorageError::Init(e.to_string()))?;

        Ok(Self {
            pool,
            keys: KeyManager::ephemeral(),
            db_path: None,
        })
    }

    /// Default on-device data directory.
    pub fn default_data_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "panic-shield", "PanicShield")
            .ok_or_else(|| StorageError::Init("could not determine app data directory".into()))?;

        Ok(proj_dirs.data_dir().to_path_buf())
    }

    // === Emotions ===

    /// Save an emotion log. Assigns `id` and `timestamp` when absent and
    /// returns the id. No internal retry: any failure propagates so the
    /// caller can write its fallback cache instead.
    pub fn save_emotion(&self, mut record: EmotionRecord) -> Result<String> {
        validate_emotion(&record)?;

        let id = record
            .id
            .get_or_insert_with(|| generate_id("emotion"))
            .clone();
        let timestamp = record
            .timestamp
            .get_or_insert_with(|| Utc::now().to_rfc3339())
            .clone();

        let sealed = self.seal_record(&record)?;

        let conn = self.pool.get()?;
        RecordsRepo::put(&conn, Collection::Emotions, &id, &sealed, &timestamp)?;

        debug!(id = %id, "Saved emotion record");
        Ok(id)
    }

    /// Get one emotion log by id.
    pub fn get_emotion(&self, id: &str) -> Result<Option<EmotionRecord>> {
        let conn = self.pool.get()?;
        match RecordsRepo::get(&conn, Collection::Emotions, id)? {
            Some(sealed) => Ok(Some(self.open_record(&sealed)?)),
            None => Ok(None),
        }
    }

    /// Get every emotion log, oldest first.
    ///
    /// All-or-nothing: a single unreadable record fails the whole call. A
    /// decrypt failure almost always means a key mismatch affecting every
    /// row, and failing loudly routes the caller to its fallback cache
    /// instead of silently presenting a partial history.
    pub fn get_all_emotions(&self) -> Result<Vec<EmotionRecord>> {
        let conn = self.pool.get()?;
        RecordsRepo::get_all(&conn, Collection::Emotions)?
            .iter()
            .map(|sealed| self.open_record(sealed))
            .collect()
    }

    /// Delete an emotion log. Deleting an absent id is a no-op.
    pub fn delete_emotion(&self, id: &str) -> Result<()> {
        let conn = self.pool.get()?;
        if !RecordsRepo::delete(&conn, Collection::Emotions, id)? {
            debug!(id = %id, "Delete of absent emotion record ignored");
        }
        Ok(())
    }

    // === Panic sessions ===

    /// Save a panic session. A second save with the same id overwrites the
    /// first (the session-end write).
    pub fn save_panic_session(&self, mut session: PanicSessionRecord) -> Result<String> {
        if let Some(end_time) = session.end_time {
            if end_time < session.start_time {
                return Err(StorageError::InvalidRecord(format!(
                    "session end time {} precedes start time {}",
                    end_time, session.start_time
                )));
            }
        }

        let id = session
            .id
            .get_or_insert_with(|| generate_id("panic"))
            .clone();

        let sealed = self.seal_record(&session)?;

        let conn = self.pool.get()?;
        RecordsRepo::put(
            &conn,
            Collection::PanicSessions,
            &id,
            &sealed,
            &Utc::now().to_rfc3339(),
        )?;

        debug!(id = %id, ended = session.end_time.is_some(), "Saved panic session");
        Ok(id)
    }

    /// Get one panic session by id.
    pub fn get_panic_session(&self, id: &str) -> Result<Option<PanicSessionRecord>> {
        let conn = self.pool.get()?;
        match RecordsRepo::get(&conn, Collection::PanicSessions, id)? {
            Some(sealed) => Ok(Some(self.open_record(&sealed)?)),
            None => Ok(None),
        }
    }

    /// Get every panic session. All-or-nothing, as for emotions.
    pub fn get_all_panic_sessions(&self) -> Result<Vec<PanicSessionRecord>> {
        let conn = self.pool.get()?;
        RecordsRepo::get_all(&conn, Collection::PanicSessions)?
            .iter()
            .map(|sealed| self.open_record(sealed))
            .collect()
    }

    // === Emergency contacts ===

    /// Save an emergency contact.
    pub fn save_emergency_contact(&self, mut contact: EmergencyContact) -> Result<String> {
        let id = contact
            .id
            .get_or_insert_with(|| generate_id("contact"))
            .clone();

        let sealed = self.seal_record(&contact)?;

        let conn = self.pool.get()?;
        RecordsRepo::put(
            &conn,
            Collection::EmergencyContacts,
            &id,
            &sealed,
            &Utc::now().to_rfc3339(),
        )?;

        Ok(id)
    }

    /// Get every emergency contact.
    pub fn get_emergency_contacts(&self) -> Result<Vec<EmergencyContact>> {
        let conn = self.pool.get()?;
        RecordsRepo::get_all(&conn, Collection::EmergencyContacts)?
            .iter()
            .map(|sealed| self.open_record(sealed))
            .collect()
    }

    /// Delete an emergency contact. Deleting an absent id is a no-op.
    pub fn delete_emergency_contact(&self, id: &str) -> Result<()> {
        let conn = self.pool.get()?;
        RecordsRepo::delete(&conn, Collection::EmergencyContacts, id)?;
        Ok(())
    }

    // === Settings (plain, unencrypted) ===

    /// Set a setting value.
    pub fn save_setting(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.pool.get()?;
        SettingsRepo::set(&conn, key, value)
    }

    /// Get a setting value.
    pub fn get_setting(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.pool.get()?;
        SettingsRepo::get(&conn, key)
    }

    // === Export / import ===

    /// Export all collections as one self-contained ciphertext blob.
    ///
    /// The decoded collections are wrapped with an export timestamp and a
    /// format version, then the entire bundle is re-encrypted as a single
    /// unit. Reversing it requires only the same (or a derivable) key.
    pub fn export_data(&self, include_settings: bool) -> Result<String> {
        let settings = if include_settings {
            let conn = self.pool.get()?;
            SettingsRepo::get_all(&conn)?
        } else {
            Vec::new()
        };

        let bundle = ExportBundle {
            version: SCHEMA_VERSION,
            export_date: Utc::now().to_rfc3339(),
            emotions: self.get_all_emotions()?,
            panic_sessions: self.get_all_panic_sessions()?,
            emergency_contacts: self.get_emergency_contacts()?,
            settings,
        };

        info!(
            emotions = bundle.emotions.len(),
            panic_sessions = bundle.panic_sessions.len(),
            contacts = bundle.emergency_contacts.len(),
            "Exporting data bundle"
        );

        self.keys
            .with_key(|key| codec::seal(key, &bundle, BUNDLE_AAD))
            .map_err(StorageError::Encryption)
    }

    /// Import a bundle produced by [`SecureStore::export_data`].
    ///
    /// Every contained record is re-saved through the normal per-collection
    /// save path, so imported records get fresh encoding under the CURRENT
    /// key (ids preserved). If the outer bundle fails to decrypt, nothing is
    /// written; a failure mid-import leaves earlier records in place
    /// (at-least-once, non-atomic).
    pub fn import_data(&self, blob: &str) -> Result<ImportSummary> {
        let bundle: ExportBundle = self
            .keys
            .with_key(|key| codec::open_sealed(key, blob, BUNDLE_AAD))
            .map_err(|e| StorageError::Import(e.to_string()))?;

        let mut summary = ImportSummary::default();

        for emotion in bundle.emotions {
            self.save_emotion(emotion)?;
            summary.emotions += 1;
        }

        for session in bundle.panic_sessions {
            self.save_panic_session(session)?;
            summary.panic_sessions += 1;
        }

        for contact in bundle.emergency_contacts {
            self.save_emergency_contact(contact)?;
            summary.emergency_contacts += 1;
        }

        for entry in bundle.settings {
            self.save_setting(&entry.key, &entry.value)?;
            summary.settings += 1;
        }

        info!(?summary, "Import complete");
        Ok(summary)
    }

    // === Lifecycle ===

    /// Clear emotions, panic sessions, and emergency contacts in one
    /// transaction, so a partial clear is never observable. Settings and the
    /// encryption key are untouched (separate concerns).
    pub fn clear_all_data(&self) -> Result<()> {
        let conn = self.pool.get()?;
        RecordsRepo::clear_all(&conn)?;
        info!("Cleared all encrypted collections");
        Ok(())
    }

    /// Per-collection counts plus a best-effort disk-usage estimate.
    pub fn storage_stats(&self) -> Result<StorageStats> {
        let conn = self.pool.get()?;

        let estimated_size = self
            .db_path
            .as_ref()
            .and_then(|path| std::fs::metadata(path).ok())
            .map(|meta| meta.len());

        Ok(StorageStats {
            emotion_count: RecordsRepo::count(&conn, Collection::Emotions)?,
            panic_session_count: RecordsRepo::count(&conn, Collection::PanicSessions)?,
            contact_count: RecordsRepo::count(&conn, Collection::EmergencyContacts)?,
            estimated_size,
        })
    }

    // === Key operations ===

    /// Replace the active key with one derived from `secret` (persisted
    /// salt, Argon2id). Bare swap: records sealed under the previous key
    /// become unreadable until re-saved. Prefer
    /// [`SecureStore::rotate_key_to_secret`] on a populated store.
    pub fn derive_key_from_secret(&self, secret: &str) -> Result<()> {
        self.keys
            .derive_from_secret(secret)
            .map_err(|e| StorageError::Init(e.to_string()))
    }

    /// Rotate to a secret-derived key, re-sealing every encrypted record.
    ///
    /// All collections are decoded under the current key, re-encrypted under
    /// the candidate key inside one transaction, and only then is the
    /// candidate installed as the active key. A failure at any point leaves
    /// both the database and the active key unchanged.
    ///
    /// The installed key lives only for this process: a reopened store loads
    /// the persisted device key again, so callers must re-derive with the
    /// same secret ([`SecureStore::derive_key_from_secret`]) before reading
    /// rotated records.
    pub fn rotate_key_to_secret(&self, secret: &str) -> Result<()> {
        let candidate = self
            .keys
            .derive_candidate(secret)
            .map_err(|e| StorageError::Init(e.to_string()))?;

        let emotions = self.get_all_emotions()?;
        let sessions = self.get_all_panic_sessions()?;
        let contacts = self.get_emergency_contacts()?;

        let conn = self.pool.get()?;
        let tx = conn.unchecked_transaction()?;

        for record in &emotions {
            let id = require_id(record.id.as_deref())?;
            let timestamp = record
                .timestamp
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339());
            let sealed = candidate
                .with(|key| codec::seal(key, record, RECORD_AAD))
                .map_err(StorageError::Encryption)?;
            RecordsRepo::put(&tx, Collection::Emotions, id, &sealed, &timestamp)?;
        }

        let now = Utc::now().to_rfc3339();
        for session in &sessions {
            let id = require_id(session.id.as_deref())?;
            let sealed = candidate
                .with(|key| codec::seal(key, session, RECORD_AAD))
                .map_err(StorageError::Encryption)?;
            RecordsRepo::put(&tx, Collection::PanicSessions, id, &sealed, &now)?;
        }

        for contact in &contacts {
            let id = require_id(contact.id.as_deref())?;
            let sealed = candidate
                .with(|key| codec::seal(key, contact, RECORD_AAD))
                .map_err(StorageError::Encryption)?;
            RecordsRepo::put(&tx, Collection::EmergencyContacts, id, &sealed, &now)?;
        }

        tx.commit()?;

        self.keys
            .install(candidate)
            .map_err(|e| StorageError::Init(e.to_string()))?;

        info!(
            emotions = emotions.len(),
            panic_sessions = sessions.len(),
            contacts = contacts.len(),
            "Rotated encryption key and re-sealed all collections"
        );
        Ok(())
    }

    // === Helpers ===

    fn seal_record<T: serde::Serialize>(&self, record: &T) -> Result<String> {
        self.keys
            .with_key(|key| codec::seal(key, record, RECORD_AAD))
            .map_err(StorageError::Encryption)
    }

    fn open_record<T: serde::de::DeserializeOwned>(&self, sealed: &str) -> Result<T> {
        self.keys
            .with_key(|key| codec::open_sealed(key, sealed, RECORD_AAD))
            .map_err(StorageError::Decryption)
    }
}

fn validate_emotion(record: &EmotionRecord) -> Result<()> {
    if !(1..=3).contains(&record.intensity) {
        return Err(StorageError::InvalidRecord(format!(
            "intensity {} outside 1-3 scale",
            record.intensity
        )));
    }

    if let Some(notes) = &record.notes {
        if notes.chars().count() > MAX_NOTES_LEN {
            return Err(StorageError::InvalidRecord(format!(
                "notes exceed {MAX_NOTES_LEN} characters"
            )));
        }
    }

    Ok(())
}

fn require_id(id: Option<&str>) -> Result<&str> {
    id.ok_or_else(|| StorageError::InvalidRecord("stored record missing id".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionOutcome;
    use serde_json::json;

    fn emotion(emotion_id: &str, intensity: u8) -> EmotionRecord {
        EmotionRecord {
            id: None,
            emotion_id: emotion_id.into(),
            intensity,
            triggers: vec!["work".into()],
            notes: None,
            suggestion: None,
            timestamp: None,
        }
    }

    #[test]
    fn test_log_then_undo() {
        let store = SecureStore::in_memory().unwrap();

        let id = store.save_emotion(emotion("happy_joyful", 2)).unwrap();

        let all = store.get_all_emotions().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id.as_deref(), Some(id.as_str()));
        assert_eq!(all[0].emotion_id, "happy_joyful");
        assert_eq!(all[0].triggers, vec!["work".to_string()]);
        assert!(all[0].timestamp.is_some());

        store.delete_emotion(&id).unwrap();
        assert!(store.get_all_emotions().unwrap().is_empty());
    }

    #[test]
    fn test_save_assigns_distinct_ids() {
        let store = SecureStore::in_memory().unwrap();

        let mut ids: Vec<String> = (0..20)
            .map(|_| store.save_emotion(emotion("anxious", 1)).unwrap())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = SecureStore::in_memory().unwrap();

        let id = store.save_emotion(emotion("sad", 1)).unwrap();
        store.delete_emotion(&id).unwrap();
        // Second delete of the same id must not error.
        store.delete_emotion(&id).unwrap();
    }

    #[test]
    fn test_intensity_out_of_range_rejected() {
        let store = SecureStore::in_memory().unwrap();

        assert!(matches!(
            store.save_emotion(emotion("angry", 0)),
            Err(StorageError::InvalidRecord(_))
        ));
        assert!(matches!(
            store.save_emotion(emotion("angry", 4)),
            Err(StorageError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_panic_session_lifecycle() {
        let store = SecureStore::in_memory().unwrap();
        let start = 1_700_000_000_000;

        let id = store
            .save_panic_session(PanicSessionRecord {
                id: None,
                start_time: start,
                end_time: None,
                exercises: vec!["breathing".into()],
                outcome: None,
                effectiveness: None,
            })
            .unwrap();

        // Session-end write: same id, now carrying the end fields.
        let ended = store
            .save_panic_session(PanicSessionRecord {
                id: Some(id.clone()),
                start_time: start,
                end_time: Some(start + 120_000),
                exercises: vec!["breathing".into()],
                outcome: Some(SessionOutcome::Resolved),
                effectiveness: Some(4),
            })
            .unwrap();
        assert_eq!(ended, id);

        let sessions = store.get_all_panic_sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].end_time, Some(start + 120_000));
        assert_eq!(sessions[0].outcome, Some(SessionOutcome::Resolved));
    }

    #[test]
    fn test_session_end_before_start_rejected() {
        let store = SecureStore::in_memory().unwrap();

        let result = store.save_panic_session(PanicSessionRecord {
            id: None,
            start_time: 2000,
            end_time: Some(1000),
            exercises: vec![],
            outcome: None,
            effectiveness: None,
        });
        assert!(matches!(result, Err(StorageError::InvalidRecord(_))));
    }

    #[test]
    fn test_contacts_crud() {
        let store = SecureStore::in_memory().unwrap();

        let id = store
            .save_emergency_contact(EmergencyContact {
                id: None,
                name: "Sam".into(),
                phone: "+1-555-0100".into(),
                relationship: Some("sibling".into()),
            })
            .unwrap();

        let contacts = store.get_emergency_contacts().unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Sam");

        store.delete_emergency_contact(&id).unwrap();
        assert!(store.get_emergency_contacts().unwrap().is_empty());
    }

    #[test]
    fn test_settings_round_trip() {
        let store = SecureStore::in_memory().unwrap();

        store.save_setting("theme", &json!("dark")).unwrap();
        assert_eq!(store.get_setting("theme").unwrap(), Some(json!("dark")));
        assert!(store.get_setting("missing").unwrap().is_none());
    }

    #[test]
    fn test_settings_stored_in_plaintext() {
        let store = SecureStore::in_memory().unwrap();
        store.save_setting("theme", &json!("dark")).unwrap();

        // Read the raw row to confirm settings bypass the codec.
        let conn = store.pool.get().unwrap();
        let raw: String = conn
            .query_row("SELECT value FROM settings WHERE key = 'theme'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(raw, "\"dark\"");
    }

    #[test]
    fn test_emotion_rows_are_ciphertext() {
        let store = SecureStore::in_memory().unwrap();
        store.save_emotion(emotion("happy_joyful", 2)).unwrap();

        let conn = store.pool.get().unwrap();
        let raw: String = conn
            .query_row("SELECT data FROM emotions", [], |r| r.get(0))
            .unwrap();
        assert!(!raw.contains("happy_joyful"));
    }

    #[test]
    fn test_export_import_closure() {
        let source = SecureStore::in_memory().unwrap();

        let emotion_id = source.save_emotion(emotion("calm_peaceful", 3)).unwrap();
        source
            .save_panic_session(PanicSessionRecord {
                id: None,
                start_time: 1000,
                end_time: Some(5000),
                exercises: vec!["grounding".into()],
                outcome: Some(SessionOutcome::Resolved),
                effectiveness: Some(5),
            })
            .unwrap();
        source
            .save_emergency_contact(EmergencyContact {
                id: None,
                name: "Alex".into(),
                phone: "555".into(),
                relationship: None,
            })
            .unwrap();
        source.save_setting("theme", &json!("dark")).unwrap();

        let blob = source.export_data(true).unwrap();

        // Import into an empty store sharing the same key.
        let target = SecureStore {
            pool: ConnectionPool::in_memory().unwrap(),
            keys: source.keys.clone(),
            db_path: None,
        };
        let summary = target.import_data(&blob).unwrap();
        assert_eq!(summary.emotions, 1);
        assert_eq!(summary.panic_sessions, 1);
        assert_eq!(summary.emergency_contacts, 1);
        assert_eq!(summary.settings, 1);

        let emotions = target.get_all_emotions().unwrap();
        assert_eq!(emotions, source.get_all_emotions().unwrap());
        assert_eq!(emotions[0].id.as_deref(), Some(emotion_id.as_str()));
        assert_eq!(
            target.get_all_panic_sessions().unwrap(),
            source.get_all_panic_sessions().unwrap()
        );
        assert_eq!(target.get_setting("theme").unwrap(), Some(json!("dark")));
    }

    #[test]
    fn test_import_under_wrong_key_writes_nothing() {
        let source = SecureStore::in_memory().unwrap();
        source.save_emotion(emotion("sad", 1)).unwrap();
        let blob = source.export_data(false).unwrap();

        let target = SecureStore::in_memory().unwrap(); // different key
        assert!(matches!(
            target.import_data(&blob),
            Err(StorageError::Import(_))
        ));
        assert!(target.get_all_emotions().unwrap().is_empty());
    }

    #[test]
    fn test_import_garbage_fails() {
        let store = SecureStore::in_memory().unwrap();
        assert!(matches!(
            store.import_data("not a bundle"),
            Err(StorageError::Import(_))
        ));
    }

    #[test]
    fn test_clear_all_is_atomic_and_spares_settings() {
        let store = SecureStore::in_memory().unwrap();

        store.save_emotion(emotion("sad", 1)).unwrap();
        store
            .save_panic_session(PanicSessionRecord {
                id: None,
                start_time: 1,
                end_time: None,
                exercises: vec![],
                outcome: None,
                effectiveness: None,
            })
            .unwrap();
        store
            .save_emergency_contact(EmergencyContact {
                id: None,
                name: "Sam".into(),
                phone: "555".into(),
                relationship: None,
            })
            .unwrap();
        store.save_setting("theme", &json!("dark")).unwrap();

        store.clear_all_data().unwrap();

        assert!(store.get_all_emotions().unwrap().is_empty());
        assert!(store.get_all_panic_sessions().unwrap().is_empty());
        assert!(store.get_emergency_contacts().unwrap().is_empty());
        assert_eq!(store.get_setting("theme").unwrap(), Some(json!("dark")));
    }

    #[test]
    fn test_storage_stats() {
        let store = SecureStore::in_memory().unwrap();

        store.save_emotion(emotion("sad", 1)).unwrap();
        store.save_emotion(emotion("angry", 2)).unwrap();

        let stats = store.storage_stats().unwrap();
        assert_eq!(stats.emotion_count, 2);
        assert_eq!(stats.panic_session_count, 0);
        assert_eq!(stats.contact_count, 0);
        // No file backing, so no size estimate - and no error either.
        assert!(stats.estimated_size.is_none());
    }

    #[test]
    fn test_key_swap_makes_old_records_unreadable() {
        let store = SecureStore::in_memory().unwrap();
        store.save_emotion(emotion("sad", 1)).unwrap();

        store.derive_key_from_secret("1234").unwrap();

        assert!(matches!(
            store.get_all_emotions(),
            Err(StorageError::Decryption(_))
        ));
    }

    #[test]
    fn test_rotation_preserves_data() {
        let store = SecureStore::in_memory().unwrap();

        let id = store.save_emotion(emotion("calm_peaceful", 2)).unwrap();
        store
            .save_emergency_contact(EmergencyContact {
                id: None,
                name: "Alex".into(),
                phone: "555".into(),
                relationship: None,
            })
            .unwrap();

        store.rotate_key_to_secret("1234").unwrap();

        let emotions = store.get_all_emotions().unwrap();
        assert_eq!(emotions.len(), 1);
        assert_eq!(emotions[0].id.as_deref(), Some(id.as_str()));
        assert_eq!(store.get_emergency_contacts().unwrap().len(), 1);
    }

    #[test]
    fn test_rotated_store_reopens_with_derived_key() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("shield.db");

        let id = {
            let store = SecureStore::open_at(&db_path, dir.path()).unwrap();
            let id = store.save_emotion(emotion("calm_peaceful", 2)).unwrap();
            store.rotate_key_to_secret("1234").unwrap();
            id
        };

        // A fresh open loads the persisted device key, not the PIN-derived
        // one, so the records stay sealed until the secret is re-derived.
        let reopened = SecureStore::open_at(&db_path, dir.path()).unwrap();
        assert!(matches!(
            reopened.get_all_emotions(),
            Err(StorageError::Decryption(_))
        ));

        reopened.derive_key_from_secret("1234").unwrap();
        let all = reopened.get_all_emotions().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id.as_deref(), Some(id.as_str()));
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("shield.db");

        let id = {
            let store = SecureStore::open_at(&db_path, dir.path()).unwrap();
            store.save_emotion(emotion("happy_joyful", 2)).unwrap()
        };

        let reopened = SecureStore::open_at(&db_path, dir.path()).unwrap();
        let all = reopened.get_all_emotions().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id.as_deref(), Some(id.as_str()));

        let stats = reopened.storage_stats().unwrap();
        assert!(stats.estimated_size.unwrap_or(0) > 0);
    }
}

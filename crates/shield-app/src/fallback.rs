//! Unencrypted fallback cache.
//!
//! A plain JSON shadow of the emotion log, written after every successful
//! facade save (as a backup) or as the sole write target when the facade
//! fails. Only minimal fields are kept - no notes, no triggers - and the
//! file is NOT encrypted. That is an explicit, accepted trade-off: on the
//! degraded path availability wins over confidentiality, so the user never
//! loses access to their most recent logs.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// File name of the backup list inside the app data directory.
pub const BACKUP_FILE: &str = "emotion-logs-backup.json";

/// Errors writing or reading the cache file.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Minimal emotion record kept on the degraded path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    pub id: String,
    pub emotion_id: String,
    pub intensity: u8,
    pub timestamp: String,
}

/// File-backed list of [`BackupRecord`]s.
pub struct FallbackCache {
    path: PathBuf,
}

impl FallbackCache {
    /// Cache backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache at the conventional location inside `data_dir`.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(data_dir.into().join(BACKUP_FILE))
    }

    /// Load all backup records. A missing or unparsable file yields an empty
    /// list - the cache exists for recovery, so it must never be the thing
    /// that fails the caller.
    pub fn load(&self) -> Vec<BackupRecord> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };

        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!("Fallback cache at {:?} is unparsable: {e}", self.path);
                Vec::new()
            }
        }
    }

    /// Append one record.
    pub fn append(&self, record: BackupRecord) -> Result<(), CacheError> {
        let mut records = self.load();
        records.push(record);
        self.write(&records)
    }

    /// Remove and return the most recent record.
    pub fn pop_last(&self) -> Result<Option<BackupRecord>, CacheError> {
        let mut records = self.load();
        let last = records.pop();
        if last.is_some() {
            self.write(&records)?;
        }
        Ok(last)
    }

    /// Delete the cache file.
    pub fn clear(&self) -> Result<(), CacheError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, records: &[BackupRecord]) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(records)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> BackupRecord {
        BackupRecord {
            id: id.into(),
            emotion_id: "sad_down".into(),
            intensity: 1,
            timestamp: "2024-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FallbackCache::in_dir(dir.path());
        assert!(cache.load().is_empty());
    }

    #[test]
    fn test_append_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FallbackCache::in_dir(dir.path());

        cache.append(record("a")).unwrap();
        cache.append(record("b")).unwrap();

        let records = cache.load();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, "b");
    }

    #[test]
    fn test_pop_last() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FallbackCache::in_dir(dir.path());

        cache.append(record("a")).unwrap();
        cache.append(record("b")).unwrap();

        let popped = cache.pop_last().unwrap();
        assert_eq!(popped.map(|r| r.id), Some("b".to_string()));
        assert_eq!(cache.load().len(), 1);

        assert!(cache.pop_last().unwrap().is_some());
        assert!(cache.pop_last().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(BACKUP_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        let cache = FallbackCache::new(path);
        assert!(cache.load().is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FallbackCache::in_dir(dir.path());

        cache.append(record("a")).unwrap();
        cache.clear().unwrap();
        cache.clear().unwrap();
        assert!(cache.load().is_empty());
    }

    #[test]
    fn test_backup_record_uses_camel_case() {
        let json = serde_json::to_value(record("a")).unwrap();
        assert_eq!(json["emotionId"], "sad_down");
    }
}

//! Data models for storage.
//!
//! Records serialize with camelCase field names so the sealed JSON matches
//! the on-disk and export format (`emotionId`, `startTime`, ...).

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Maximum length of free-text notes, in characters.
pub const MAX_NOTES_LEN: usize = 2000;

/// One logged emotion. Immutable once written except for deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionRecord {
    /// Opaque unique id; assigned at save when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Reference into the static emotion taxonomy (not owned here).
    pub emotion_id: String,
    /// Intensity on a 1-3 scale.
    pub intensity: u8,
    /// Free-text trigger tags, may be empty.
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Free text, bounded by [`MAX_NOTES_LEN`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Advisory free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// ISO-8601; assigned at save when absent. Records may be backdated or
    /// imported out of order, so no monotonicity is enforced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Outcome of a panic-relief session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOutcome {
    Resolved,
    Escalated,
    Abandoned,
}

impl SessionOutcome {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionOutcome::Resolved => "resolved",
            SessionOutcome::Escalated => "escalated",
            SessionOutcome::Abandoned => "abandoned",
        }
    }

    /// Parse from string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "resolved" => Some(SessionOutcome::Resolved),
            "escalated" => Some(SessionOutcome::Escalated),
            "abandoned" => Some(SessionOutcome::Abandoned),
            _ => None,
        }
    }
}

/// One panic-relief session. Created at exercise start, overwritten once at
/// session end (same id, carrying `end_time`/`outcome`/`effectiveness`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanicSessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Epoch milliseconds.
    pub start_time: i64,
    /// Epoch milliseconds; absent while the session is active.
    /// Must be >= `start_time` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    /// Exercise-type tags visited during the session.
    #[serde(default)]
    pub exercises: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SessionOutcome>,
    /// Small integer rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effectiveness: Option<u8>,
}

/// User-managed emergency contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

/// A plain (unencrypted) settings entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingEntry {
    pub key: String,
    pub value: serde_json::Value,
}

/// Per-collection counts plus a best-effort disk-usage estimate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub emotion_count: i64,
    pub panic_session_count: i64,
    pub contact_count: i64,
    /// Database file length in bytes; absent for in-memory stores.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_size: Option<u64>,
}

/// Decrypted payload of an export blob. The whole bundle is sealed as one
/// ciphertext, so an export is self-contained given the same (or a derivable)
/// key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    /// Export format version.
    pub version: i32,
    /// ISO-8601 timestamp of the export.
    pub export_date: String,
    pub emotions: Vec<EmotionRecord>,
    pub panic_sessions: Vec<PanicSessionRecord>,
    pub emergency_contacts: Vec<EmergencyContact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<SettingEntry>,
}

/// Per-collection counts of records written by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub emotions: usize,
    pub panic_sessions: usize,
    pub emergency_contacts: usize,
    pub settings: usize,
}

/// Generate an opaque record id: `<prefix>_<epoch millis>_<random suffix>`.
pub fn generate_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect();
    format!("{prefix}_{millis}_{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_record_serializes_camel_case() {
        let record = EmotionRecord {
            id: Some("emotion_1_abc".into()),
            emotion_id: "happy_joyful".into(),
            intensity: 2,
            triggers: vec!["work".into()],
            notes: None,
            suggestion: None,
            timestamp: Some("2024-01-01T00:00:00Z".into()),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["emotionId"], "happy_joyful");
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn test_session_outcome_round_trip() {
        for outcome in [
            SessionOutcome::Resolved,
            SessionOutcome::Escalated,
            SessionOutcome::Abandoned,
        ] {
            assert_eq!(SessionOutcome::parse(outcome.as_str()), Some(outcome));
        }
        assert_eq!(SessionOutcome::parse("unknown"), None);

        let json = serde_json::to_string(&SessionOutcome::Resolved).unwrap();
        assert_eq!(json, "\"resolved\"");
    }

    #[test]
    fn test_panic_session_optional_fields_deserialize() {
        let session: PanicSessionRecord =
            serde_json::from_str(r#"{"startTime": 1000, "exercises": ["breathing"]}"#).unwrap();
        assert_eq!(session.start_time, 1000);
        assert!(session.end_time.is_none());
        assert!(session.outcome.is_none());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let mut ids: Vec<String> = (0..100).map(|_| generate_id("emotion")).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 100);
        assert!(ids[0].starts_with("emotion_"));
    }
}

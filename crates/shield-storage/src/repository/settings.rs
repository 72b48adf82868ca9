//! Settings repository.
//!
//! Plain key-value pairs, stored without encryption (low sensitivity, read on
//! hot paths).

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::SettingEntry;

/// Repository for settings operations.
pub struct SettingsRepo;

impl SettingsRepo {
    /// Get a setting value.
    pub fn get(conn: &Connection, key: &str) -> Result<Option<serde_json::Value>> {
        let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?1")?;

        let value = stmt
            .query_row([key], |row| {
                let value_str: String = row.get(0)?;
                Ok(serde_json::from_str(&value_str).unwrap_or(serde_json::Value::Null))
            })
            .optional()?;

        Ok(value)
    }

    /// Set a setting value (insert or update).
    pub fn set(conn: &Connection, key: &str, value: &serde_json::Value) -> Result<()> {
        let value_json = serde_json::to_string(value)?;

        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value_json],
        )?;

        Ok(())
    }

    /// Get all settings, ordered by key.
    pub fn get_all(conn: &Connection) -> Result<Vec<SettingEntry>> {
        let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;

        let entries = stmt
            .query_map([], |row| {
                let value_str: String = row.get(1)?;
                Ok(SettingEntry {
                    key: row.get(0)?,
                    value: serde_json::from_str(&value_str).unwrap_or(serde_json::Value::Null),
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(entries)
    }
}

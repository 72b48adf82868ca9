//! Keyed record store over the encrypted collections.
//!
//! All three encrypted tables share one shape (`id`, `data`, `timestamp`), so
//! a single repository serves them, parameterized by [`Collection`]. Each
//! statement is individually atomic; [`RecordsRepo::clear_all`] wraps the
//! multi-collection clear in one transaction so partial clears are never
//! observable.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;

/// One of the independently keyed encrypted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Emotions,
    PanicSessions,
    EmergencyContacts,
}

impl Collection {
    /// All encrypted collections, in clear order.
    pub const ALL: [Collection; 3] = [
        Collection::Emotions,
        Collection::PanicSessions,
        Collection::EmergencyContacts,
    ];

    /// Backing table name.
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Emotions => "emotions",
            Collection::PanicSessions => "panic_sessions",
            Collection::EmergencyContacts => "emergency_contacts",
        }
    }
}

/// Repository for sealed-record operations.
pub struct RecordsRepo;

impl RecordsRepo {
    /// Insert or overwrite a sealed record (last commit wins).
    pub fn put(
        conn: &Connection,
        collection: Collection,
        id: &str,
        data: &str,
        timestamp: &str,
    ) -> Result<()> {
        conn.execute(
            &format!(
                "INSERT INTO {} (id, data, timestamp) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET data = ?2, timestamp = ?3",
                collection.table()
            ),
            params![id, data, timestamp],
        )?;

        Ok(())
    }

    /// Get a sealed record by id.
    pub fn get(conn: &Connection, collection: Collection, id: &str) -> Result<Option<String>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT data FROM {} WHERE id = ?1",
            collection.table()
        ))?;

        // `optional` maps only QueryReturnedNoRows to None; real database
        // errors still propagate.
        let data = stmt.query_row([id], |row| row.get(0)).optional()?;
        Ok(data)
    }

    /// Get all sealed records in a collection, oldest write first.
    pub fn get_all(conn: &Connection, collection: Collection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT data FROM {} ORDER BY timestamp ASC, id ASC",
            collection.table()
        ))?;

        let records = stmt
            .query_map([], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(records)
    }

    /// Delete by id. Returns whether a row was removed; a missing key is a
    /// no-op, not an error.
    pub fn delete(conn: &Connection, collection: Collection, id: &str) -> Result<bool> {
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", collection.table()),
            [id],
        )?;
        Ok(deleted > 0)
    }

    /// Remove every record in one collection.
    pub fn clear(conn: &Connection, collection: Collection) -> Result<()> {
        conn.execute(&format!("DELETE FROM {}", collection.table()), [])?;
        Ok(())
    }

    /// Remove every record in all encrypted collections, in one transaction.
    pub fn clear_all(conn: &Connection) -> Result<()> {
        let tx = conn.unchecked_transaction()?;
        for collection in Collection::ALL {
            tx.execute(&format!("DELETE FROM {}", collection.table()), [])?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Count records in a collection.
    pub fn count(conn: &Connection, collection: Collection) -> Result<i64> {
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", collection.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

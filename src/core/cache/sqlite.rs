//! Cache store on the `transients` table

use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{CacheError, CacheStore};

/// Cache store persisted next to the issue data
///
/// Expired entries read as absent and are removed lazily.
pub struct SqliteCacheStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteCacheStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let removed = self.conn.execute(
            "DELETE FROM transients WHERE expires_at < ?1",
            params![Utc::now().timestamp()],
        )?;
        Ok(removed)
    }
}

impl CacheStore for SqliteCacheStore<'_> {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let row: Option<(String, i64)> = self
            .conn
            .query_row(
                "SELECT value, expires_at FROM transients WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((_, expires_at)) if expires_at < Utc::now().timestamp() => {
                self.delete(key)?;
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = Utc::now().timestamp().saturating_add(ttl_secs);
        self.conn.execute(
            "INSERT OR REPLACE INTO transients (key, value, expires_at) VALUES (?1, ?2, ?3)",
            params![key, value, expires_at],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.conn
            .execute("DELETE FROM transients WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::Database;

    #[test]
    fn test_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCacheStore::new(db.connection());

        store.set("a11y_x", "{\"n\":1}", Duration::from_secs(60)).unwrap();
        assert_eq!(store.get("a11y_x").unwrap().as_deref(), Some("{\"n\":1}"));

        store.set("a11y_x", "{\"n\":2}", Duration::from_secs(60)).unwrap();
        assert_eq!(store.get("a11y_x").unwrap().as_deref(), Some("{\"n\":2}"));

        store.delete("a11y_x").unwrap();
        assert_eq!(store.get("a11y_x").unwrap(), None);
    }

    #[test]
    fn test_expired_entry_reads_as_absent() {
        let db = Database::open_in_memory().unwrap();
        db.connection()
            .execute(
                "INSERT INTO transients (key, value, expires_at) VALUES ('old', 'v', ?1)",
                params![Utc::now().timestamp() - 10],
            )
            .unwrap();

        let store = SqliteCacheStore::new(db.connection());
        assert_eq!(store.get("old").unwrap(), None);
        // Reading removed it
        let left: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM transients", [], |row| row.get(0))
            .unwrap();
        assert_eq!(left, 0);
    }

    #[test]
    fn test_purge_expired_keeps_live_entries() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCacheStore::new(db.connection());
        store.set("live", "v", Duration::from_secs(60)).unwrap();
        db.connection()
            .execute(
                "INSERT INTO transients (key, value, expires_at) VALUES ('old', 'v', ?1)",
                params![Utc::now().timestamp() - 10],
            )
            .unwrap();

        assert_eq!(store.purge_expired().unwrap(), 1);
        assert_eq!(store.purge_expired().unwrap(), 0);
        assert_eq!(store.get("live").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCacheStore::new(db.connection());
        store.set("k", "v", Duration::from_secs(u64::MAX)).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}

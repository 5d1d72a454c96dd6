//! In-process cache store

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{CacheError, CacheStore};
use crate::core::clock::{saturating_add, Clock, SystemClock};

struct Entry {
    value: String,
    ttl: Duration,
    expires_at: DateTime<Utc>,
}

/// Cache store kept in memory for the lifetime of the value
///
/// Expired entries read as absent and are dropped on access.
pub struct MemoryCacheStore {
    entries: RefCell<HashMap<String, Entry>>,
    clock: Rc<dyn Clock>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::with_clock(Rc::new(SystemClock))
    }

    /// Store whose expiry follows `clock`
    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            clock,
        }
    }

    /// Whether a live entry is stored under `key`
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .borrow()
            .get(key)
            .is_some_and(|entry| entry.expires_at >= now)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// TTL an entry was stored with
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.entries.borrow().get(key).map(|entry| entry.ttl)
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheStore")
            .field("entries", &self.len())
            .finish()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = self.clock.now();
        let mut entries = self.entries.borrow_mut();
        let expired = match entries.get(key) {
            Some(entry) => entry.expires_at < now,
            None => return Ok(None),
        };

        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        // Too long for a timestamp delta: lives until the latest representable instant
        let lifetime = chrono::Duration::from_std(ttl)
            .unwrap_or_else(|_| chrono::Duration::days(1_000_000_000));
        let entry = Entry {
            value: value.to_string(),
            ttl,
            expires_at: saturating_add(self.clock.now(), lifetime),
        };
        self.entries.borrow_mut().insert(key.to_string(), entry);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

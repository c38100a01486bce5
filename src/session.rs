//! Keyed session store with per-entry expiry.
//!
//! The transport does not persist envelopes itself; this collaborator holds
//! session-scoped values (current user, drafts, a checkpointed outbox) under
//! a shared key prefix, with optional expiry checked on read.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::types::{Result, SESSION_PREFIX};

#[derive(Debug)]
struct StoredEntry {
    value: serde_json::Value,
    stored_at: Instant,
    expiry: Option<Duration>,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        match self.expiry {
            Some(expiry) => self.stored_at.elapsed() >= expiry,
            None => false,
        }
    }
}

/// In-memory keyed store with per-entry expiry
#[derive(Debug)]
pub struct SessionStore {
    prefix: String,
    entries: Mutex<HashMap<String, StoredEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_prefix(SESSION_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Stores a value under the prefixed key, replacing any previous entry
    pub fn set<T: Serialize>(&self, key: &str, value: &T, expiry: Option<Duration>) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.entries.lock().unwrap().insert(
            self.full_key(key),
            StoredEntry {
                value,
                stored_at: Instant::now(),
                expiry,
            },
        );
        Ok(())
    }

    /// Reads a value back. Expired entries are removed and read as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = self.full_key(key);
        let mut entries = self.entries.lock().unwrap();

        let entry = entries.get(&full_key)?;
        if entry.is_expired() {
            entries.remove(&full_key);
            return None;
        }

        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Failed to decode session entry '{key}': {e}");
                None
            }
        }
    }

    /// Removes an entry; returns whether one was present
    pub fn remove(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .remove(&self.full_key(key))
            .is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        let entries = self.entries.lock().unwrap();
        entries
            .get(&self.full_key(key))
            .is_some_and(|entry| !entry.is_expired())
    }

    /// Number of live (non-expired) entries
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap();
        entries.values().filter(|entry| !entry.is_expired()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry under this store's prefix
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

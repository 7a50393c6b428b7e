//! Shared in-memory storage helper backing the `InMemory*Repository`
//! implementations (C4): a revisioned key-value map guarded by a
//! `parking_lot::RwLock`, with the optimistic-concurrency precondition
//! checks `update`/`delete` require.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::Revision;
use crate::errors::{CoreError, Result};

/// A record stored through [`Store`] must expose and accept its own
/// revision so the store can stamp it on `create`/`update`.
pub trait Revisioned {
    fn revision(&self) -> Revision;
    fn set_revision(&mut self, revision: Revision);
}

/// Generic revisioned key-value map, keyed by the aggregate's `uid` (spec
/// §4.4, "Repository Contracts"). Every `InMemory*Repository` wraps one of
/// these per aggregate type, adding whatever secondary indices its contract
/// needs on top.
pub struct Store<V> {
    rows: RwLock<HashMap<String, V>>,
}

impl<V: Clone + Revisioned> Store<V> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    pub fn create(&self, key: String, mut value: V) -> Result<V> {
        let mut rows = self.rows.write();
        if rows.contains_key(&key) {
            return Err(CoreError::conflict(format!("{key} already exists")));
        }
        value.set_revision(Revision::NONE.next());
        rows.insert(key, value.clone());
        Ok(value)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.rows.read().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.rows.read().get(key).cloned()
    }

    /// Update `key`, enforcing that its stored revision equals `expected`
    /// ("update/delete require the caller's revision to match the
    /// stored revision, else Conflict").
    pub fn update(&self, key: &str, expected: Revision, mut value: V) -> Result<V> {
        let mut rows = self.rows.write();
        let current = rows
            .get(key)
            .ok_or_else(|| CoreError::not_found(format!("{key} not found")))?;
        if current.revision() != expected {
            return Err(CoreError::conflict(format!(
                "revision mismatch for {key}: expected {expected}, found {}",
                current.revision()
            )));
        }
        value.set_revision(expected.next());
        rows.insert(key.to_string(), value.clone());
        Ok(value)
    }

    pub fn delete(&self, key: &str, expected: Revision) -> Result<()> {
        let mut rows = self.rows.write();
        let current = rows
            .get(key)
            .ok_or_else(|| CoreError::not_found(format!("{key} not found")))?;
        if current.revision() != expected {
            return Err(CoreError::conflict(format!(
                "revision mismatch for {key}: expected {expected}, found {}",
                current.revision()
            )));
        }
        rows.remove(key);
        Ok(())
    }

    /// Delete `key` with no revision precondition ("skip revision check" —
    /// spec.md §4.9's `meeting.deleted` teardown, which must not fail on a
    /// concurrent mutation racing the read that produced this delete).
    pub fn delete_unconditional(&self, key: &str) -> Result<()> {
        let mut rows = self.rows.write();
        if rows.remove(key).is_none() {
            return Err(CoreError::not_found(format!("{key} not found")));
        }
        Ok(())
    }

    pub fn all(&self) -> Vec<V> {
        self.rows.read().values().cloned().collect()
    }
}

impl<V: Clone + Revisioned> Default for Store<V> {
    fn default() -> Self {
        Self::new()
    }
}

//! Flat string key-value persistence.
//!
//! `LocalStorage` talks to `window.localStorage`; `MemoryStore` is the
//! in-process stand-in used by native tests. Both are cheap handles: clones
//! share the same underlying storage, so the progression store, the redeem
//! ledger and the preferences can each own one.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::StorageError;

pub const KEY_XP: &str = "linkhub.xp";
pub const KEY_LEVEL: &str = "linkhub.level";
pub const KEY_REDEEMED: &str = "linkhub.redeemed";
pub const KEY_VOLUME: &str = "linkhub.volume";
pub const KEY_THEME: &str = "linkhub.theme";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Browser `localStorage`. The handle is looked up on each call so a page that
/// disables storage mid-session only loses persistence, not the session.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        let win = web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".into()))?;
        win.local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }
}

/// Shared in-memory map. `set_available(false)` makes every call fail with
/// `StorageError::Unavailable`, which is how tests simulate a full quota.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    map: Rc<RefCell<HashMap<String, String>>>,
    available: Rc<Cell<bool>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            map: Rc::new(RefCell::new(HashMap::new())),
            available: Rc::new(Cell::new(true)),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.available.get() {
            Ok(())
        } else {
            Err(StorageError::Unavailable("memory store disabled".into()))
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.map.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.map.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.map.borrow_mut().remove(key);
        Ok(())
    }
}

/// Read a key, treating a storage failure like a missing value.
pub(crate) fn read_or_none<S: KeyValueStore>(store: &S, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("read of '{key}' failed: {e}");
            None
        }
    }
}

/// Write a key, logging and swallowing any failure.
pub(crate) fn write_or_log<S: KeyValueStore>(store: &S, key: &str, value: &str) {
    if let Err(e) = store.set(key, value) {
        tracing::warn!("write of '{key}' failed: {e}");
    }
}

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::{KeyValueStore, StoreError};

/// In-process store for tests. Reads and writes can be made to fail on
/// demand to exercise the error paths of the persistence layer.
#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.insert_raw(key, value);
        store
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn fail_reads(&self, enabled: bool) {
        self.fail_reads.set(enabled);
    }

    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.set(enabled);
    }

    fn injected(operation: &str) -> StoreError {
        StoreError::Io(std::io::Error::other(format!("injected {operation} failure")))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_reads.get() {
            return Err(Self::injected("read"));
        }
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(Self::injected("write"));
        }
        self.insert_raw(key, value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(Self::injected("delete"));
        }
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

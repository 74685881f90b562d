//! Public key directory contract and the in-memory backend
//!
//! Entries are write-once: once a name is bound, nobody (including the
//! storage adversary) can substitute another key under it.

use std::collections::HashMap;
use std::sync::RwLock;

use sfs_core::{SfsError, SfsResult};

pub trait KeyDirectory: Send + Sync {
    /// Bind `entry` to `key`. `AlreadyExists` if the entry is taken.
    fn set(&self, entry: &str, key: Vec<u8>) -> SfsResult<()>;

    fn get(&self, entry: &str) -> SfsResult<Option<Vec<u8>>>;

    fn contains(&self, entry: &str) -> SfsResult<bool> {
        Ok(self.get(entry)?.is_some())
    }
}

#[derive(Debug, Default)]
pub struct MemoryDirectory {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyDirectory for MemoryDirectory {
    fn set(&self, entry: &str, key: Vec<u8>) -> SfsResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| SfsError::Storage("directory lock poisoned".into()))?;
        if entries.contains_key(entry) {
            return Err(SfsError::AlreadyExists(entry.to_string()));
        }
        tracing::debug!(entry, "directory entry published");
        entries.insert(entry.to_string(), key);
        Ok(())
    }

    fn get(&self, entry: &str) -> SfsResult<Option<Vec<u8>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| SfsError::Storage("directory lock poisoned".into()))?;
        Ok(entries.get(entry).cloned())
    }
}

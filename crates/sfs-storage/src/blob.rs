//! Blob store contract and the in-memory backend

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use sfs_core::{RecordId, SfsError, SfsResult};

/// Id-addressed record storage. Implementations need not be trustworthy.
pub trait BlobStore: Send + Sync {
    /// Create or replace the record at `id`.
    fn put(&self, id: &RecordId, bytes: Vec<u8>) -> SfsResult<()>;

    /// Fetch the record at `id`, or `None` if absent.
    fn get(&self, id: &RecordId) -> SfsResult<Option<Vec<u8>>>;

    /// Remove the record at `id`. Removing an absent record is not an error.
    fn delete(&self, id: &RecordId) -> SfsResult<()>;
}

/// `RwLock<HashMap>` backed store; the default backend for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<RecordId, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&self) -> SfsResult<RwLockReadGuard<'_, HashMap<RecordId, Vec<u8>>>> {
        self.blobs
            .read()
            .map_err(|_| SfsError::Storage("blob store lock poisoned".into()))
    }

    pub(crate) fn write(&self) -> SfsResult<RwLockWriteGuard<'_, HashMap<RecordId, Vec<u8>>>> {
        self.blobs
            .write()
            .map_err(|_| SfsError::Storage("blob store lock poisoned".into()))
    }

    pub fn len(&self) -> SfsResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> SfsResult<bool> {
        Ok(self.read()?.is_empty())
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, id: &RecordId, bytes: Vec<u8>) -> SfsResult<()> {
        tracing::trace!(%id, len = bytes.len(), "blob put");
        self.write()?.insert(*id, bytes);
        Ok(())
    }

    fn get(&self, id: &RecordId) -> SfsResult<Option<Vec<u8>>> {
        let found = self.read()?.get(id).cloned();
        tracing::trace!(%id, hit = found.is_some(), "blob get");
        Ok(found)
    }

    fn delete(&self, id: &RecordId) -> SfsResult<()> {
        tracing::trace!(%id, "blob delete");
        self.write()?.remove(id);
        Ok(())
    }
}

//! The shared collaborators every client handle talks to

use std::sync::Arc;

use sfs_core::config::CryptoConfig;
use sfs_core::{KeyRole, RecordId, SfsError, SfsResult};
use sfs_crypto::{CredentialParams, EncryptionKey, VerifyKey};
use sfs_storage::{BlobStore, KeyDirectory};

/// Blob store, key directory and credential cost parameters.
///
/// Cheap to clone; all handles for all users of one deployment share it.
#[derive(Clone)]
pub struct Backend {
    store: Arc<dyn BlobStore>,
    directory: Arc<dyn KeyDirectory>,
    params: CredentialParams,
}

impl Backend {
    pub fn new(
        store: Arc<dyn BlobStore>,
        directory: Arc<dyn KeyDirectory>,
        params: CredentialParams,
    ) -> Self {
        Self {
            store,
            directory,
            params,
        }
    }

    pub fn from_config(
        store: Arc<dyn BlobStore>,
        directory: Arc<dyn KeyDirectory>,
        config: &CryptoConfig,
    ) -> Self {
        Self::new(store, directory, CredentialParams::from(config))
    }

    pub fn params(&self) -> &CredentialParams {
        &self.params
    }

    pub(crate) fn directory(&self) -> &dyn KeyDirectory {
        self.directory.as_ref()
    }

    /// Raw directory lookup; `NotFound` if the entry is absent.
    fn public_key(&self, username: &str, role: KeyRole) -> SfsResult<Vec<u8>> {
        let entry = role.entry(username);
        self.directory
            .get(&entry)?
            .ok_or(SfsError::NotFound(entry))
    }

    pub(crate) fn verify_key(&self, username: &str) -> SfsResult<VerifyKey> {
        let bytes = self.public_key(username, KeyRole::Verify)?;
        VerifyKey::from_bytes(&bytes).map_err(|e| SfsError::integrity(format!("{username}: {e}")))
    }

    pub(crate) fn encryption_key(&self, username: &str) -> SfsResult<EncryptionKey> {
        let bytes = self.public_key(username, KeyRole::Encrypt)?;
        EncryptionKey::from_bytes(&bytes).map_err(|e| SfsError::integrity(format!("{username}: {e}")))
    }

    /// True if both directory entries for `username` exist.
    pub(crate) fn has_account(&self, username: &str) -> SfsResult<bool> {
        for role in KeyRole::ALL {
            if !self.directory.contains(&role.entry(username))? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub(crate) fn get(&self, id: &RecordId) -> SfsResult<Option<Vec<u8>>> {
        self.store.get(id)
    }

    /// Fetch a record the protocol expects to exist. A missing record means
    /// the store dropped or hid it, which is an integrity failure.
    pub(crate) fn fetch(&self, id: &RecordId, what: &str) -> SfsResult<Vec<u8>> {
        self.store
            .get(id)?
            .ok_or_else(|| SfsError::integrity(format!("{what} {id} missing from store")))
    }

    pub(crate) fn put(&self, id: &RecordId, bytes: Vec<u8>) -> SfsResult<()> {
        self.store.put(id, bytes)
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

//! Access verification chain: filename → sentinel → metadata

use sfs_core::{SfsError, SfsResult};
use sfs_crypto::{filename_hash, SymmetricKey};

use crate::records::{FilePointer, Metadata, Sentinel};
use crate::user::Session;

/// A file whose sentinel and metadata have both been verified.
pub(crate) struct OpenFile {
    pub pointer: FilePointer,
    pub sentinel: Sentinel,
    pub metadata_key: SymmetricKey,
    pub metadata: Metadata,
}

impl Session<'_> {
    /// Resolve `filename` and verify every link to its metadata.
    ///
    /// `AccessDenied` if the caller has no pointer for `filename`. Any later
    /// failure purges the pointer before returning the error.
    pub(crate) fn open_file(&mut self, filename: &str) -> SfsResult<OpenFile> {
        let name_hash = filename_hash(filename, self.username());
        let pointer = self
            .record()
            .files
            .get(&name_hash)
            .cloned()
            .ok_or_else(|| SfsError::access_denied(format!("no file named {filename:?}")))?;

        match self.verify_chain(&pointer) {
            Ok((sentinel, metadata_key, metadata)) => Ok(OpenFile {
                pointer,
                sentinel,
                metadata_key,
                metadata,
            }),
            Err(err) => {
                tracing::warn!(
                    username = self.username(),
                    sentinel = %pointer.sentinel,
                    error = %err,
                    "file failed verification, dropping pointer"
                );
                self.purge(&name_hash);
                Err(err)
            }
        }
    }

    fn verify_chain(&self, pointer: &FilePointer) -> SfsResult<(Sentinel, SymmetricKey, Metadata)> {
        let backend = self.backend();
        let owner_key = backend.verify_key(&pointer.owner)?;

        let sentinel = Sentinel::from_bytes(&backend.fetch(&pointer.sentinel, "sentinel")?)?;
        let metadata_key = sentinel.unlock(self.username(), &self.record().decryption_key)?;
        sentinel.verify_lock(&metadata_key, &owner_key)?;
        tracing::debug!(sentinel = %pointer.sentinel, "sentinel lock verified");

        let metadata_id = sentinel.metadata_id;
        let metadata = Metadata::open(
            &metadata_id,
            &backend.fetch(&metadata_id, "metadata")?,
            &metadata_key,
            backend,
        )?;
        if metadata.owner != pointer.owner {
            return Err(SfsError::integrity(format!(
                "metadata owner {} differs from expected owner {}",
                metadata.owner, pointer.owner
            )));
        }
        tracing::debug!(metadata = %metadata_id, signer = %metadata.last_modifier, "metadata verified");
        Ok((sentinel, metadata_key, metadata))
    }
}

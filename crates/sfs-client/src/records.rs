//! Records kept in the untrusted store
//!
//! | record   | at rest                                   | authenticated by                 |
//! |----------|-------------------------------------------|----------------------------------|
//! | user     | sealed JSON, salted MAC layout            | password-derived MAC key         |
//! | sentinel | plain JSON                                | owner's signature over the lock  |
//! | metadata | sealed JSON, signed layout                | last modifier's signature        |
//! | block    | sealed JSON, MAC layout                   | content MAC key from metadata    |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sfs_core::{RecordId, SfsError, SfsResult};
use sfs_crypto::encoding::base64_bytes;
use sfs_crypto::{
    lock_digest, DecryptionKey, EncryptionKey, Layout, MacKey, Seal, SealedRecord, Signature,
    SigningIdentity, SymmetricKey, Unseal, VerifyKey, WrappedKey,
};

use crate::access::AccessGraph;
use crate::backend::Backend;

fn to_json<T: Serialize>(value: &T) -> SfsResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| SfsError::Other(e.into()))
}

fn from_json<T: for<'de> Deserialize<'de>>(bytes: &[u8], what: &str) -> SfsResult<T> {
    serde_json::from_slice(bytes).map_err(|e| SfsError::integrity(format!("malformed {what}: {e}")))
}

/// Where a user finds a file: its sentinel and the owner who signs its lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePointer {
    pub sentinel: RecordId,
    pub owner: String,
}

/// A user's private state. Never stored unsealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub decryption_key: DecryptionKey,
    pub signing_key: SigningIdentity,
    /// filename hash → pointer
    pub files: BTreeMap<String, FilePointer>,
}

impl UserRecord {
    pub fn generate(username: &str) -> Self {
        Self {
            username: username.to_string(),
            decryption_key: DecryptionKey::generate(),
            signing_key: SigningIdentity::generate(),
            files: BTreeMap::new(),
        }
    }

    pub(crate) fn to_json(&self) -> SfsResult<Vec<u8>> {
        to_json(self)
    }

    pub(crate) fn from_json(bytes: &[u8]) -> SfsResult<Self> {
        from_json(bytes, "user record")
    }
}

/// Entry point of a file: who may unlock the metadata, and which metadata.
///
/// Any member may add a wrapped key when sharing; only the owner can produce
/// a lock that verifies, so the store cannot point a sentinel at other metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentinel {
    pub metadata_id: RecordId,
    /// Owner's signature over `lock_digest(metadata_id, metadata_key)`
    pub lock: Signature,
    /// username → metadata key wrapped for that user
    pub keys: BTreeMap<String, WrappedKey>,
}

impl Sentinel {
    /// Fresh sentinel with a signed lock and no members.
    pub fn new(metadata_id: RecordId, metadata_key: &SymmetricKey, owner: &SigningIdentity) -> Self {
        Self {
            metadata_id,
            lock: owner.sign(&lock_digest(&metadata_id, metadata_key)),
            keys: BTreeMap::new(),
        }
    }

    /// Wrap `metadata_key` for `username` and add (or replace) their entry.
    pub fn grant(
        &mut self,
        username: &str,
        recipient: &EncryptionKey,
        metadata_key: &SymmetricKey,
    ) -> SfsResult<()> {
        let wrapped = WrappedKey::new(metadata_key, recipient)?;
        self.keys.insert(username.to_string(), wrapped);
        Ok(())
    }

    /// Unwrap `username`'s copy of the metadata key.
    pub fn unlock(&self, username: &str, key: &DecryptionKey) -> SfsResult<SymmetricKey> {
        let wrapped = self
            .keys
            .get(username)
            .ok_or_else(|| SfsError::access_denied(format!("{username} has no key in sentinel")))?;
        wrapped
            .recover(key)
            .map_err(|e| SfsError::integrity(format!("metadata key unwrap: {e}")))
    }

    /// Check the owner's signature binds this sentinel to `metadata_key`.
    pub fn verify_lock(&self, metadata_key: &SymmetricKey, owner: &VerifyKey) -> SfsResult<()> {
        owner
            .verify(&lock_digest(&self.metadata_id, metadata_key), &self.lock)
            .map_err(|_| SfsError::integrity("sentinel lock signature mismatch"))
    }

    pub fn to_bytes(&self) -> SfsResult<Vec<u8>> {
        to_json(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> SfsResult<Self> {
        from_json(bytes, "sentinel")
    }
}

/// Per-file state shared by every member, sealed under the metadata key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub id: RecordId,
    pub access: AccessGraph,
    pub last_modifier: String,
    pub owner: String,
    pub content_key: SymmetricKey,
    pub content_mac_key: MacKey,
    /// Content block ids in file order
    pub blocks: Vec<RecordId>,
}

impl Metadata {
    /// Empty file owned by `owner`, with fresh content keys.
    pub fn new(id: RecordId, owner: &str) -> Self {
        Self {
            id,
            access: AccessGraph::rooted(owner),
            last_modifier: owner.to_string(),
            owner: owner.to_string(),
            content_key: SymmetricKey::generate(),
            content_mac_key: MacKey::generate(),
            blocks: Vec::new(),
        }
    }

    /// Replace both content keys; existing blocks must be re-sealed by the caller.
    pub fn rotate_content_keys(&mut self) {
        self.content_key = SymmetricKey::generate();
        self.content_mac_key = MacKey::generate();
    }

    /// Seal under `key`, signed by the writer, who must be `last_modifier`.
    pub fn seal(&self, key: &SymmetricKey, writer: &SigningIdentity) -> SfsResult<Vec<u8>> {
        let plaintext = to_json(self)?;
        Ok(SealedRecord::seal(&self.id, &plaintext, key, Seal::Signature(writer))?.to_bytes())
    }

    /// Open metadata stored at `id`.
    ///
    /// The signer is named inside the ciphertext, so this decrypts before it
    /// verifies. The AEAD tag (keyed by the metadata key, bound to `id`) is
    /// checked before any plaintext is parsed, and the key itself was
    /// authenticated by the owner-signed sentinel lock. What remains exposed
    /// is JSON parsing of bytes written by some holder of the metadata key;
    /// the signature check below then rejects holders that are not members
    /// or did not sign.
    ///
    /// TODO: revisit this ordering. Moving `last_modifier` into a plaintext
    /// header covered by the signature would let the signature be checked
    /// before anything is decrypted.
    pub fn open(
        id: &RecordId,
        bytes: &[u8],
        key: &SymmetricKey,
        backend: &Backend,
    ) -> SfsResult<Self> {
        let sealed = SealedRecord::parse(bytes, Layout::Signed)?;
        let metadata: Metadata = from_json(&sealed.decrypt(id, key)?, "metadata")?;

        if !metadata.access.contains(&metadata.last_modifier) {
            return Err(SfsError::integrity(format!(
                "metadata last modified by non-member {}",
                metadata.last_modifier
            )));
        }
        let signer = backend.verify_key(&metadata.last_modifier)?;
        sealed.verify(id, Unseal::Signature(&signer))?;

        if metadata.id != *id {
            return Err(SfsError::integrity(format!(
                "metadata id {} does not match storage id {id}",
                metadata.id
            )));
        }
        Ok(metadata)
    }
}

/// One stored chunk of file content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: RecordId,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl ContentBlock {
    pub fn new(data: &[u8]) -> Self {
        Self {
            id: RecordId::random(),
            data: data.to_vec(),
        }
    }

    pub fn seal(&self, metadata: &Metadata) -> SfsResult<Vec<u8>> {
        let plaintext = to_json(self)?;
        let sealed = SealedRecord::seal(
            &self.id,
            &plaintext,
            &metadata.content_key,
            Seal::Mac(&metadata.content_mac_key),
        )?;
        Ok(sealed.to_bytes())
    }

    /// Verify, decrypt and check the embedded id matches `id`.
    pub fn open(id: &RecordId, bytes: &[u8], metadata: &Metadata) -> SfsResult<Self> {
        let plaintext = SealedRecord::parse(bytes, Layout::Mac)?.open(
            id,
            Unseal::Mac(&metadata.content_mac_key),
            &metadata.content_key,
        )?;
        let block: ContentBlock = from_json(&plaintext, "content block")?;
        if block.id != *id {
            return Err(SfsError::integrity(format!(
                "block id {} does not match storage id {id}",
                block.id
            )));
        }
        Ok(block)
    }
}

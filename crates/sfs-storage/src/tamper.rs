//! Adversarial perturbations of a [`MemoryBlobStore`]
//!
//! Models everything a hostile storage server can do to stored bytes: flip
//! bits, delete records, overwrite them with garbage, swap two records, and
//! roll the whole store back to an earlier snapshot.

use std::collections::HashMap;

use sfs_core::{RecordId, SfsResult};

use crate::blob::MemoryBlobStore;

/// A point-in-time copy of every record, for replay/rollback attacks.
#[derive(Debug, Clone, Default)]
pub struct Snapshot(HashMap<RecordId, Vec<u8>>);

impl Snapshot {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl MemoryBlobStore {
    /// All stored ids in a stable order.
    pub fn ids(&self) -> SfsResult<Vec<RecordId>> {
        let mut ids: Vec<RecordId> = self.read()?.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    /// Flip one bit of the record at `id`. `byte` wraps around the record
    /// length. Returns `false` if the record is absent or empty.
    pub fn flip_bit(&self, id: &RecordId, byte: usize, bit: u8) -> SfsResult<bool> {
        let mut blobs = self.write()?;
        match blobs.get_mut(id) {
            Some(bytes) if !bytes.is_empty() => {
                let idx = byte % bytes.len();
                bytes[idx] ^= 1 << (bit % 8);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Replace the record at `id` (creating it if absent).
    pub fn overwrite(&self, id: &RecordId, bytes: Vec<u8>) -> SfsResult<()> {
        self.write()?.insert(*id, bytes);
        Ok(())
    }

    /// Exchange the contents of two distinct records. Returns `false` unless both exist.
    pub fn swap(&self, a: &RecordId, b: &RecordId) -> SfsResult<bool> {
        let mut blobs = self.write()?;
        if a == b || !blobs.contains_key(a) || !blobs.contains_key(b) {
            return Ok(false);
        }
        let (Some(first), Some(second)) = (blobs.remove(a), blobs.remove(b)) else {
            return Ok(false);
        };
        blobs.insert(*a, second);
        blobs.insert(*b, first);
        Ok(true)
    }

    pub fn snapshot(&self) -> SfsResult<Snapshot> {
        Ok(Snapshot(self.read()?.clone()))
    }

    /// Roll the store back to `snapshot`, dropping records created since.
    pub fn restore(&self, snapshot: &Snapshot) -> SfsResult<()> {
        *self.write()? = snapshot.0.clone();
        Ok(())
    }
}

/// One adversarial step. Record targets are indices into [`MemoryBlobStore::ids`],
/// taken modulo the number of stored records, so any generated value is valid.
#[derive(Debug, Clone)]
pub enum TamperAction {
    FlipBit { target: usize, byte: usize, bit: u8 },
    Delete { target: usize },
    Overwrite { target: usize, garbage: Vec<u8> },
    Swap { a: usize, b: usize },
}

impl TamperAction {
    /// Apply to `store`. Returns the ids whose bytes were touched.
    pub fn apply(&self, store: &MemoryBlobStore) -> SfsResult<Vec<RecordId>> {
        let ids = store.ids()?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let pick = |i: usize| ids[i % ids.len()];

        let touched = match self {
            TamperAction::FlipBit { target, byte, bit } => {
                let id = pick(*target);
                store.flip_bit(&id, *byte, *bit)?.then_some(vec![id])
            }
            TamperAction::Delete { target } => {
                let id = pick(*target);
                crate::BlobStore::delete(store, &id)?;
                Some(vec![id])
            }
            TamperAction::Overwrite { target, garbage } => {
                let id = pick(*target);
                store.overwrite(&id, garbage.clone())?;
                Some(vec![id])
            }
            TamperAction::Swap { a, b } => {
                let (a, b) = (pick(*a), pick(*b));
                store.swap(&a, &b)?.then_some(vec![a, b])
            }
        };

        if let Some(ids) = &touched {
            tracing::debug!(action = ?self, ?ids, "tampered with store");
        }
        Ok(touched.unwrap_or_default())
    }
}

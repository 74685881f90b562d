//! Domain-separated BLAKE3 digests for local filename keys and sentinel locks

use sfs_core::RecordId;

use crate::keys::SymmetricKey;

const FILENAME_CONTEXT: &str = "sfs 2024 filename-hash v1";
const LOCK_CONTEXT: &str = "sfs 2024 sentinel-lock v1";

/// Length-prefix each part so ("a-b", "c") and ("a", "b-c") hash differently.
fn update_framed(hasher: &mut blake3::Hasher, part: &[u8]) {
    hasher.update(&(part.len() as u64).to_le_bytes());
    hasher.update(part);
}

/// Key under which a user's record stores the pointers for `filename`.
///
/// Mixing in the username keeps the key unlinkable across accounts.
pub fn filename_hash(filename: &str, username: &str) -> String {
    let mut hasher = blake3::Hasher::new_derive_key(FILENAME_CONTEXT);
    update_framed(&mut hasher, filename.as_bytes());
    update_framed(&mut hasher, username.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Value the file owner signs to bind a sentinel to its metadata record and key.
pub fn lock_digest(metadata_id: &RecordId, metadata_key: &SymmetricKey) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(LOCK_CONTEXT);
    hasher.update(metadata_id.as_bytes());
    hasher.update(metadata_key.as_bytes());
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_hash_deterministic() {
        assert_eq!(filename_hash("notes.txt", "alice"), filename_hash("notes.txt", "alice"));
        assert_eq!(filename_hash("notes.txt", "alice").len(), 64);
    }

    #[test]
    fn test_filename_hash_separates_inputs() {
        assert_ne!(filename_hash("a-b", "c"), filename_hash("a", "b-c"));
        assert_ne!(filename_hash("notes.txt", "alice"), filename_hash("notes.txt", "bob"));
        assert_ne!(filename_hash("Notes.txt", "alice"), filename_hash("notes.txt", "alice"));
    }

    #[test]
    fn test_lock_binds_id_and_key() {
        let id = RecordId::random();
        let key = SymmetricKey::generate();

        assert_eq!(lock_digest(&id, &key), lock_digest(&id, &key));
        assert_ne!(lock_digest(&id, &key), lock_digest(&RecordId::random(), &key));
        assert_ne!(lock_digest(&id, &key), lock_digest(&id, &SymmetricKey::generate()));
    }
}

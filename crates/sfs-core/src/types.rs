use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Fixed-size identifier of a record in the blob store.
///
/// Client-chosen: random for sentinels, metadata and content blocks, derived
/// from credentials for user records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

/// Size of a record id in bytes
pub const RECORD_ID_SIZE: usize = 16;

impl RecordId {
    /// Fresh random id (UUID v4).
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_bytes(bytes: [u8; RECORD_ID_SIZE]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; RECORD_ID_SIZE] {
        self.0.as_bytes()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which public key a directory entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRole {
    /// Ed25519 verifying key
    Verify,
    /// X25519 public key used to wrap keys for this user
    Encrypt,
}

impl KeyRole {
    pub const ALL: [KeyRole; 2] = [KeyRole::Verify, KeyRole::Encrypt];

    pub fn suffix(self) -> &'static str {
        match self {
            KeyRole::Verify => "-DSVerifyKey",
            KeyRole::Encrypt => "-PKEEncKey",
        }
    }

    /// Directory entry name for `username` in this role.
    pub fn entry(self, username: &str) -> String {
        format!("{username}{}", self.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(RecordId::random(), RecordId::random());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let id = RecordId::random();
        assert_eq!(RecordId::from_bytes(*id.as_bytes()), id);
    }

    #[test]
    fn test_serializes_as_plain_uuid_string() {
        #[derive(Serialize)]
        struct Wrap {
            id: RecordId,
        }
        let id = RecordId::from_bytes([0xAB; RECORD_ID_SIZE]);
        let encoded = toml::to_string(&Wrap { id }).unwrap();
        assert_eq!(encoded.trim(), format!("id = \"{id}\""));
    }

    #[test]
    fn test_directory_entries() {
        assert_eq!(KeyRole::Verify.entry("alice"), "alice-DSVerifyKey");
        assert_eq!(KeyRole::Encrypt.entry("Alice"), "Alice-PKEEncKey");
    }
}

//! sfs-crypto: record cryptography for SentinelFS
//!
//! Every record in the untrusted store is sealed the same way:
//!
//! ```text
//! plaintext → PKCS#7 pad (16) → XChaCha20-Poly1305 (AAD = record id) → authenticate → serialize
//!
//! wire:  auth ‖ [salt] ‖ nonce ‖ ciphertext ‖ tag
//!        auth = keyed BLAKE3 MAC (32)   user records, content blocks
//!             | Ed25519 signature (64)  sentinels' locks, metadata
//!        salt = 16 bytes, user records only
//! ```
//!
//! Key hierarchy:
//! ```text
//! (username, password)
//!   ├── record id     iterated SHA-512
//!   └── Argon2id(salt) → record key, Argon2id(!salt) → record MAC key
//! metadata key (random, wrapped per user: X25519 ECDH → HKDF-SHA256 → AES-256-KW)
//!   └── metadata record { content key, content MAC key, ... }
//! ```

pub mod codec;
pub mod encoding;
pub mod hash;
pub mod kdf;
pub mod keys;
pub mod padding;
pub mod wrap;

pub use codec::{Layout, Seal, SealedRecord, Unseal};
pub use hash::{filename_hash, lock_digest};
pub use kdf::{derive_user_id, derive_user_keys, generate_salt, CredentialParams, KdfParams, UserKeys};
pub use keys::{DecryptionKey, EncryptionKey, MacKey, Signature, SigningIdentity, SymmetricKey, VerifyKey};
pub use padding::{pad, unpad};
pub use wrap::WrappedKey;

/// Size of a symmetric key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Padding block size; ciphertext lengths are always a multiple of this
pub const BLOCK_SIZE: usize = 16;

/// Size of a keyed BLAKE3 MAC
pub const MAC_SIZE: usize = 32;

/// Size of an Ed25519 signature
pub const SIGNATURE_SIZE: usize = 64;

/// Size of the per-record Argon2id salt on user records
pub const SALT_SIZE: usize = 16;

/// Size of an X25519 public key
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Wrapped key: ephemeral X25519 public key (32) ‖ AES-256-KW output (40)
pub const WRAPPED_KEY_SIZE: usize = PUBLIC_KEY_SIZE + KEY_SIZE + 8;

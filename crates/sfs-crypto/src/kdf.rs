//! Credential derivation: (username, password) → record id and record keys
//!
//! - record id: SHA-512 iterated `identifier_hash_rounds` times, first 16 bytes
//! - record key: Argon2id(credentials, salt)
//! - record MAC key: Argon2id(credentials, !salt)

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sfs_core::config::CryptoConfig;
use sfs_core::{RecordId, RECORD_ID_SIZE};
use sha2::{Digest, Sha512};
use zeroize::Zeroizing;

use crate::keys::{MacKey, SymmetricKey};
use crate::{KEY_SIZE, SALT_SIZE};

/// Argon2id parameters for KDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::from(&CryptoConfig::default())
    }
}

impl From<&CryptoConfig> for KdfParams {
    fn from(config: &CryptoConfig) -> Self {
        Self {
            mem_cost_kib: config.argon2_mem_cost_kib,
            time_cost: config.argon2_time_cost,
            parallelism: config.argon2_parallelism,
        }
    }
}

/// Everything needed to turn a username and password into record id and keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialParams {
    pub kdf: KdfParams,
    pub id_rounds: u32,
}

impl Default for CredentialParams {
    fn default() -> Self {
        Self::from(&CryptoConfig::default())
    }
}

impl From<&CryptoConfig> for CredentialParams {
    fn from(config: &CryptoConfig) -> Self {
        Self {
            kdf: KdfParams::from(config),
            id_rounds: config.identifier_hash_rounds,
        }
    }
}

/// Keys protecting one sealed user record.
#[derive(Debug)]
pub struct UserKeys {
    pub enc: SymmetricKey,
    pub mac: MacKey,
}

/// `len(username) ‖ username ‖ "-" ‖ password`
fn credential_input(username: &str, password: &SecretString) -> Zeroizing<Vec<u8>> {
    let password = password.expose_secret().as_bytes();
    let mut input = Zeroizing::new(Vec::with_capacity(8 + username.len() + 1 + password.len()));
    input.extend_from_slice(&(username.len() as u64).to_be_bytes());
    input.extend_from_slice(username.as_bytes());
    input.push(b'-');
    input.extend_from_slice(password);
    input
}

/// Deterministic storage id of a user's record.
///
/// Only computable with the right password; a wrong password simply points
/// at an empty slot.
pub fn derive_user_id(username: &str, password: &SecretString, rounds: u32) -> RecordId {
    let mut digest = Sha512::digest(credential_input(username, password).as_slice());
    for _ in 1..rounds {
        digest = Sha512::digest(digest);
    }

    let mut id = [0u8; RECORD_ID_SIZE];
    id.copy_from_slice(&digest[..RECORD_ID_SIZE]);
    RecordId::from_bytes(id)
}

/// Derive the record key and record MAC key for one salt.
///
/// The MAC key uses the bitwise complement of the salt, so both keys come
/// from a single stored salt without being equal.
pub fn derive_user_keys(
    username: &str,
    password: &SecretString,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> anyhow::Result<UserKeys> {
    let input = credential_input(username, password);
    let inverted_salt = salt.map(|b| !b);

    let enc = argon2id(&input, salt, params)?;
    let mac = argon2id(&input, &inverted_salt, params)?;

    Ok(UserKeys {
        enc: SymmetricKey::from_bytes(*enc),
        mac: MacKey::from_bytes(*mac),
    })
}

fn argon2id(
    input: &[u8],
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> anyhow::Result<Zeroizing<[u8; KEY_SIZE]>> {
    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| anyhow::anyhow!("invalid Argon2id params: {e}"))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    argon2
        .hash_password_into(input, salt, &mut key[..])
        .map_err(|e| anyhow::anyhow!("Argon2id KDF failed: {e}"))?;
    Ok(key)
}

/// Fresh random salt for a user record seal.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

//! Per-recipient key wrapping: X25519 ECDH + HKDF-SHA256 + AES-256-KW
//!
//! ```text
//! [ ephemeral X25519 public key: 32 bytes ][ AES-KW(kek, key): 40 bytes ]
//! kek = HKDF-SHA256(salt = ephemeral_pub ‖ recipient_pub, ikm = shared secret, info = "sfs-key-wrap")
//! ```
//!
//! A fresh ephemeral key is used for every wrap, so wrapping the same key for
//! the same recipient twice yields unrelated bytes.

use aes_kw::KekAes256 as Kek;
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::keys::{base64_serde, DecryptionKey, EncryptionKey, FixedBytes, SymmetricKey};
use crate::{KEY_SIZE, PUBLIC_KEY_SIZE, WRAPPED_KEY_SIZE};

const KEK_INFO: &[u8] = b"sfs-key-wrap";

/// A symmetric key wrapped for exactly one recipient.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WrappedKey([u8; WRAPPED_KEY_SIZE]);

impl WrappedKey {
    /// Wrap `key` so only the holder of `recipient`'s decryption key can recover it.
    pub fn new(key: &SymmetricKey, recipient: &EncryptionKey) -> anyhow::Result<Self> {
        let ephemeral = DecryptionKey::generate();
        let ephemeral_public = ephemeral.encryption_key();

        let shared = ephemeral.diffie_hellman(recipient);
        if !shared.was_contributory() {
            anyhow::bail!("recipient encryption key is a low-order point");
        }
        let kek = derive_kek(shared.as_bytes(), &ephemeral_public, recipient)?;

        let wrapped = Kek::from(*kek)
            .wrap_vec(key.as_bytes())
            .map_err(|_| anyhow::anyhow!("AES-KW wrap error"))?;

        if PUBLIC_KEY_SIZE + wrapped.len() != WRAPPED_KEY_SIZE {
            anyhow::bail!("unexpected wrapped key size: {}", wrapped.len());
        }

        let mut out = [0u8; WRAPPED_KEY_SIZE];
        out[..PUBLIC_KEY_SIZE].copy_from_slice(ephemeral_public.as_bytes());
        out[PUBLIC_KEY_SIZE..].copy_from_slice(&wrapped);
        Ok(Self(out))
    }

    /// Recover the wrapped key. Fails on the wrong recipient or any corruption.
    pub fn recover(&self, recipient: &DecryptionKey) -> anyhow::Result<SymmetricKey> {
        let (ephemeral_bytes, wrapped) = self.0.split_at(PUBLIC_KEY_SIZE);
        let ephemeral_public = EncryptionKey::from_bytes(ephemeral_bytes)?;

        let shared = recipient.diffie_hellman(&ephemeral_public);
        if !shared.was_contributory() {
            anyhow::bail!("ephemeral key is a low-order point");
        }
        let kek = derive_kek(shared.as_bytes(), &ephemeral_public, &recipient.encryption_key())?;

        let unwrapped = Zeroizing::new(
            Kek::from(*kek)
                .unwrap_vec(wrapped)
                .map_err(|_| anyhow::anyhow!("AES-KW unwrap error"))?,
        );
        if unwrapped.len() != KEY_SIZE {
            anyhow::bail!("unwrapped key has wrong size: {}", unwrapped.len());
        }

        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&unwrapped);
        Ok(SymmetricKey::from_bytes(key))
    }

    pub fn as_bytes(&self) -> &[u8; WRAPPED_KEY_SIZE] {
        &self.0
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }
}

fn derive_kek(
    shared: &[u8; KEY_SIZE],
    ephemeral: &EncryptionKey,
    recipient: &EncryptionKey,
) -> anyhow::Result<Zeroizing<[u8; KEY_SIZE]>> {
    let mut salt = [0u8; 2 * PUBLIC_KEY_SIZE];
    salt[..PUBLIC_KEY_SIZE].copy_from_slice(ephemeral.as_bytes());
    salt[PUBLIC_KEY_SIZE..].copy_from_slice(recipient.as_bytes());

    let hkdf = Hkdf::<Sha256>::new(Some(&salt[..]), shared);
    let mut okm = Zeroizing::new([0u8; KEY_SIZE]);
    hkdf.expand(KEK_INFO, &mut okm[..])
        .map_err(|e| anyhow::anyhow!("HKDF expand failed: {e}"))?;
    Ok(okm)
}

impl FixedBytes<WRAPPED_KEY_SIZE> for WrappedKey {
    fn to_fixed_bytes(&self) -> Zeroizing<[u8; WRAPPED_KEY_SIZE]> {
        Zeroizing::new(self.0)
    }

    fn from_fixed_bytes(bytes: [u8; WRAPPED_KEY_SIZE]) -> anyhow::Result<Self> {
        Ok(Self(bytes))
    }
}

base64_serde!(WrappedKey, WRAPPED_KEY_SIZE);

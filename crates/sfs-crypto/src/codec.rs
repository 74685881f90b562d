//! Sealed record codec
//!
//! Sealed record format (binary):
//! ```text
//! [auth: 32-byte MAC | 64-byte signature][salt: 16 bytes, salted layout only][body]
//! body = [24 bytes: random nonce][ciphertext][16 bytes: Poly1305 tag]
//! AAD  = record id (16 bytes)
//! auth covers: record id ‖ salt ‖ body
//! ```
//!
//! The AAD binds each record to its storage id, so a record copied or swapped
//! to another id fails to decrypt even under the right key.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use sfs_core::{RecordId, SfsError, SfsResult};

use crate::keys::{MacKey, Signature, SigningIdentity, SymmetricKey, VerifyKey};
use crate::padding::{pad, unpad};
use crate::{BLOCK_SIZE, MAC_SIZE, NONCE_SIZE, SALT_SIZE, SIGNATURE_SIZE, TAG_SIZE};

/// How a record is authenticated when sealed.
pub enum Seal<'a> {
    /// Keyed BLAKE3 under a shared key (content blocks)
    Mac(&'a MacKey),
    /// Keyed BLAKE3 plus the salt the key was derived with (user records)
    SaltedMac { key: &'a MacKey, salt: [u8; SALT_SIZE] },
    /// Ed25519 signature by the writer (metadata)
    Signature(&'a SigningIdentity),
}

/// How a record is authenticated when opened.
pub enum Unseal<'a> {
    Mac(&'a MacKey),
    Signature(&'a VerifyKey),
}

/// Expected wire layout of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Mac,
    SaltedMac,
    Signed,
}

impl Layout {
    fn auth_len(self) -> usize {
        match self {
            Layout::Mac | Layout::SaltedMac => MAC_SIZE,
            Layout::Signed => SIGNATURE_SIZE,
        }
    }

    fn salt_len(self) -> usize {
        match self {
            Layout::SaltedMac => SALT_SIZE,
            Layout::Mac | Layout::Signed => 0,
        }
    }
}

/// A parsed but not yet verified record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedRecord {
    layout: Layout,
    auth: Vec<u8>,
    salt: Option<[u8; SALT_SIZE]>,
    body: Vec<u8>,
}

impl SealedRecord {
    /// Pad, encrypt under `key` bound to `id`, and authenticate.
    pub fn seal(
        id: &RecordId,
        plaintext: &[u8],
        key: &SymmetricKey,
        auth: Seal<'_>,
    ) -> anyhow::Result<Self> {
        let body = encrypt_padded(key, id.as_bytes(), plaintext)?;

        let (layout, salt) = match &auth {
            Seal::Mac(_) => (Layout::Mac, None),
            Seal::SaltedMac { salt, .. } => (Layout::SaltedMac, Some(*salt)),
            Seal::Signature(_) => (Layout::Signed, None),
        };
        let message = authenticated_bytes(id, salt.as_ref(), &body);
        let auth = match auth {
            Seal::Mac(mac_key) | Seal::SaltedMac { key: mac_key, .. } => {
                blake3::keyed_hash(mac_key.as_bytes(), &message).as_bytes().to_vec()
            }
            Seal::Signature(identity) => identity.sign(&message).to_bytes().to_vec(),
        };

        Ok(Self {
            layout,
            auth,
            salt,
            body,
        })
    }

    /// Split stored bytes according to `layout`. Length problems are integrity failures.
    pub fn parse(bytes: &[u8], layout: Layout) -> SfsResult<Self> {
        let header = layout.auth_len() + layout.salt_len();
        if bytes.len() < header + NONCE_SIZE + BLOCK_SIZE + TAG_SIZE {
            return Err(SfsError::integrity(format!(
                "record too short: {} bytes",
                bytes.len()
            )));
        }

        let (auth, rest) = bytes.split_at(layout.auth_len());
        let (salt, body) = rest.split_at(layout.salt_len());
        if (body.len() - NONCE_SIZE - TAG_SIZE) % BLOCK_SIZE != 0 {
            return Err(SfsError::integrity("ciphertext is not block aligned"));
        }

        let salt = match layout {
            Layout::SaltedMac => {
                let mut s = [0u8; SALT_SIZE];
                s.copy_from_slice(salt);
                Some(s)
            }
            Layout::Mac | Layout::Signed => None,
        };

        Ok(Self {
            layout,
            auth: auth.to_vec(),
            salt,
            body: body.to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let salt: &[u8] = match &self.salt {
            Some(s) => s,
            None => &[],
        };
        let mut out = Vec::with_capacity(self.auth.len() + salt.len() + self.body.len());
        out.extend_from_slice(&self.auth);
        out.extend_from_slice(salt);
        out.extend_from_slice(&self.body);
        out
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// The Argon2id salt carried by user records.
    pub fn salt(&self) -> Option<&[u8; SALT_SIZE]> {
        self.salt.as_ref()
    }

    /// Check the MAC or signature over `id ‖ salt ‖ body`.
    pub fn verify(&self, id: &RecordId, unseal: Unseal<'_>) -> SfsResult<()> {
        let message = authenticated_bytes(id, self.salt.as_ref(), &self.body);
        match (self.layout, unseal) {
            (Layout::Mac | Layout::SaltedMac, Unseal::Mac(key)) => {
                let expected: [u8; MAC_SIZE] = self
                    .auth
                    .as_slice()
                    .try_into()
                    .map_err(|_| SfsError::integrity("MAC has wrong length"))?;
                // blake3::Hash equality is constant time
                if blake3::keyed_hash(key.as_bytes(), &message) != blake3::Hash::from(expected) {
                    return Err(SfsError::integrity("MAC mismatch"));
                }
                Ok(())
            }
            (Layout::Signed, Unseal::Signature(verify_key)) => {
                let signature = Signature::from_slice(&self.auth)
                    .ok_or_else(|| SfsError::integrity("signature has wrong length"))?;
                verify_key
                    .verify(&message, &signature)
                    .map_err(|e| SfsError::integrity(e.to_string()))
            }
            (layout, _) => Err(SfsError::integrity(format!(
                "verifier does not match {layout:?} record"
            ))),
        }
    }

    /// Decrypt and unpad without checking `auth`.
    ///
    /// The AEAD tag still authenticates the body against `key` and `id`; use
    /// this only when the verifier is named inside the plaintext.
    pub fn decrypt(&self, id: &RecordId, key: &SymmetricKey) -> SfsResult<Vec<u8>> {
        decrypt_padded(key, id.as_bytes(), &self.body)
    }

    /// Verify, then decrypt.
    pub fn open(&self, id: &RecordId, unseal: Unseal<'_>, key: &SymmetricKey) -> SfsResult<Vec<u8>> {
        self.verify(id, unseal)?;
        self.decrypt(id, key)
    }
}

fn authenticated_bytes(id: &RecordId, salt: Option<&[u8; SALT_SIZE]>, body: &[u8]) -> Vec<u8> {
    let salt: &[u8] = match salt {
        Some(s) => s,
        None => &[],
    };
    let mut message = Vec::with_capacity(id.as_bytes().len() + salt.len() + body.len());
    message.extend_from_slice(id.as_bytes());
    message.extend_from_slice(salt);
    message.extend_from_slice(body);
    message
}

/// Pad and encrypt with XChaCha20-Poly1305 under a random nonce.
///
/// Returns: `[24-byte nonce][ciphertext][16-byte tag]`
pub fn encrypt_padded(key: &SymmetricKey, aad: &[u8], plaintext: &[u8]) -> anyhow::Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let padded = pad(plaintext);
    let ciphertext = cipher
        .encrypt(nonce, Payload { msg: &padded, aad })
        .map_err(|e| anyhow::anyhow!("record encryption failed: {e}"))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Inverse of [`encrypt_padded`].
pub fn decrypt_padded(key: &SymmetricKey, aad: &[u8], body: &[u8]) -> SfsResult<Vec<u8>> {
    if body.len() < NONCE_SIZE + BLOCK_SIZE + TAG_SIZE {
        return Err(SfsError::integrity(format!(
            "ciphertext too short: {} bytes",
            body.len()
        )));
    }

    let (nonce_bytes, ciphertext) = body.split_at(NONCE_SIZE);
    let nonce = XNonce::from_slice(nonce_bytes);
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let padded = cipher
        .decrypt(nonce, Payload { msg: ciphertext, aad })
        .map_err(|_| SfsError::integrity("decryption failed: wrong key, wrong id, or corrupted data"))?;
    unpad(padded)
}

//! Capability tokens: how a sharer hands a recipient the way into a file
//!
//! Wire format (binary):
//! ```text
//! [64 bytes: sharer's Ed25519 signature over the rest][72 bytes: wrapped token key][envelope body]
//! envelope body = [24-byte nonce][ciphertext of padded JSON {owner, sentinel}][16-byte tag]
//! ```
//!
//! The token names neither file nor filename, only the owner and the sentinel id.

use serde::{Deserialize, Serialize};
use sfs_core::{RecordId, SfsError, SfsResult};
use sfs_crypto::codec::{decrypt_padded, encrypt_padded};
use sfs_crypto::encoding;
use sfs_crypto::{
    DecryptionKey, EncryptionKey, Signature, SigningIdentity, SymmetricKey, VerifyKey, WrappedKey,
    SIGNATURE_SIZE, WRAPPED_KEY_SIZE,
};

/// Associated data for the envelope cipher
const ENVELOPE_AAD: &[u8] = b"sfs capability envelope v1";

/// What a token grants: the sentinel of a file and who owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub owner: String,
    pub sentinel: RecordId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityToken {
    signature: Signature,
    wrapped: WrappedKey,
    body: Vec<u8>,
}

impl CapabilityToken {
    /// Seal `envelope` for `recipient`, signed by `sharer`.
    pub fn issue(
        envelope: &Envelope,
        sharer: &SigningIdentity,
        recipient: &EncryptionKey,
    ) -> SfsResult<Self> {
        let key = SymmetricKey::generate();
        let plaintext = serde_json::to_vec(envelope).map_err(|e| SfsError::Other(e.into()))?;
        let body = encrypt_padded(&key, ENVELOPE_AAD, &plaintext)?;
        let wrapped = WrappedKey::new(&key, recipient)?;

        let signature = sharer.sign(&signed_bytes(&wrapped, &body));
        Ok(Self {
            signature,
            wrapped,
            body,
        })
    }

    /// Check the sharer's signature, then recover the envelope with the
    /// recipient's key. Every failure is an integrity failure.
    pub fn accept(&self, sharer: &VerifyKey, recipient: &DecryptionKey) -> SfsResult<Envelope> {
        sharer
            .verify(&signed_bytes(&self.wrapped, &self.body), &self.signature)
            .map_err(|_| SfsError::integrity("capability token signature mismatch"))?;

        let key = self
            .wrapped
            .recover(recipient)
            .map_err(|_| SfsError::integrity("capability token not addressed to this user"))?;
        let plaintext = decrypt_padded(&key, ENVELOPE_AAD, &self.body)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| SfsError::integrity(format!("malformed capability envelope: {e}")))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SIGNATURE_SIZE + WRAPPED_KEY_SIZE + self.body.len());
        out.extend_from_slice(self.signature.as_bytes());
        out.extend_from_slice(self.wrapped.as_bytes());
        out.extend_from_slice(&self.body);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> SfsResult<Self> {
        if bytes.len() <= SIGNATURE_SIZE + WRAPPED_KEY_SIZE {
            return Err(SfsError::integrity(format!(
                "capability token too short: {} bytes",
                bytes.len()
            )));
        }
        let (signature, rest) = bytes.split_at(SIGNATURE_SIZE);
        let (wrapped, body) = rest.split_at(WRAPPED_KEY_SIZE);

        Ok(Self {
            signature: Signature::from_slice(signature)
                .ok_or_else(|| SfsError::integrity("bad token signature length"))?,
            wrapped: WrappedKey::from_slice(wrapped)
                .ok_or_else(|| SfsError::integrity("bad token wrapped key length"))?,
            body: body.to_vec(),
        })
    }

    /// Text form for out-of-band delivery.
    pub fn to_base64(&self) -> String {
        encoding::to_base64(&self.to_bytes())
    }

    pub fn from_base64(s: &str) -> SfsResult<Self> {
        let bytes = encoding::from_base64(s.trim())
            .map_err(|e| SfsError::integrity(format!("capability token: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

fn signed_bytes(wrapped: &WrappedKey, body: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(WRAPPED_KEY_SIZE + body.len());
    message.extend_from_slice(wrapped.as_bytes());
    message.extend_from_slice(body);
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Parties {
        sharer: SigningIdentity,
        recipient: DecryptionKey,
        envelope: Envelope,
    }

    fn parties() -> Parties {
        Parties {
            sharer: SigningIdentity::generate(),
            recipient: DecryptionKey::generate(),
            envelope: Envelope {
                owner: "alice".into(),
                sentinel: RecordId::random(),
            },
        }
    }

    #[test]
    fn test_issue_accept() {
        let p = parties();
        let token = CapabilityToken::issue(&p.envelope, &p.sharer, &p.recipient.encryption_key()).unwrap();

        let envelope = token.accept(&p.sharer.verify_key(), &p.recipient).unwrap();
        assert_eq!(envelope, p.envelope);
    }

    #[test]
    fn test_text_form_roundtrip() {
        let p = parties();
        let token = CapabilityToken::issue(&p.envelope, &p.sharer, &p.recipient.encryption_key()).unwrap();

        let parsed = CapabilityToken::from_base64(&token.to_base64()).unwrap();
        assert_eq!(parsed, token);
        assert_eq!(parsed.accept(&p.sharer.verify_key(), &p.recipient).unwrap(), p.envelope);
    }

    #[test]
    fn test_wrong_sender_or_recipient() {
        let p = parties();
        let token = CapabilityToken::issue(&p.envelope, &p.sharer, &p.recipient.encryption_key()).unwrap();

        let impostor = SigningIdentity::generate().verify_key();
        assert!(token.accept(&impostor, &p.recipient).unwrap_err().is_integrity());

        let eavesdropper = DecryptionKey::generate();
        assert!(token.accept(&p.sharer.verify_key(), &eavesdropper).unwrap_err().is_integrity());
    }

    #[test]
    fn test_any_flip_rejected() {
        let p = parties();
        let bytes = CapabilityToken::issue(&p.envelope, &p.sharer, &p.recipient.encryption_key())
            .unwrap()
            .to_bytes();

        for idx in (0..bytes.len()).step_by(7) {
            let mut tampered = bytes.clone();
            tampered[idx] ^= 0x04;
            let result = CapabilityToken::from_bytes(&tampered)
                .and_then(|t| t.accept(&p.sharer.verify_key(), &p.recipient));
            assert!(result.is_err(), "flip at byte {idx} went unnoticed");
        }
    }

    #[test]
    fn test_token_hides_owner() {
        let p = parties();
        let bytes = CapabilityToken::issue(&p.envelope, &p.sharer, &p.recipient.encryption_key())
            .unwrap()
            .to_bytes();
        assert!(!bytes.windows(5).any(|w| w == b"alice"));
    }

    #[test]
    fn test_truncated_token() {
        assert!(CapabilityToken::from_bytes(&[0u8; SIGNATURE_SIZE + WRAPPED_KEY_SIZE]).is_err());
        assert!(CapabilityToken::from_base64("%%%").is_err());
    }
}

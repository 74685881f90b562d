//! Key material: symmetric record keys, Ed25519 signing identities, X25519 wrapping keys
//!
//! Secret types zeroize on drop and print `[REDACTED]`. All key types
//! serialize as base64 strings.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::RngCore;
use x25519_dalek::{PublicKey as X25519PublicKey, SharedSecret, StaticSecret};
use zeroize::{Zeroize, Zeroizing};

use crate::{KEY_SIZE, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};

/// Fixed-width byte form used for base64 serde.
pub(crate) trait FixedBytes<const N: usize>: Sized {
    fn to_fixed_bytes(&self) -> Zeroizing<[u8; N]>;
    fn from_fixed_bytes(bytes: [u8; N]) -> anyhow::Result<Self>;
}

macro_rules! base64_serde {
    ($ty:ty, $n:expr) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let bytes = $crate::keys::FixedBytes::<$n>::to_fixed_bytes(self);
                let encoded = zeroize::Zeroizing::new($crate::encoding::to_base64(&bytes[..]));
                serializer.serialize_str(&encoded)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let encoded =
                    zeroize::Zeroizing::new(<String as serde::Deserialize>::deserialize(deserializer)?);
                let bytes = $crate::encoding::array_from_base64::<$n>(&encoded)
                    .map_err(serde::de::Error::custom)?;
                <$ty as $crate::keys::FixedBytes<$n>>::from_fixed_bytes(bytes)
                    .map_err(serde::de::Error::custom)
            }
        }
    };
}
pub(crate) use base64_serde;

fn random_bytes<const N: usize>() -> Zeroizing<[u8; N]> {
    let mut bytes = Zeroizing::new([0u8; N]);
    rand::thread_rng().fill_bytes(&mut bytes[..]);
    bytes
}

macro_rules! symmetric_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name {
            bytes: [u8; KEY_SIZE],
        }

        impl $name {
            pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
                Self { bytes }
            }

            /// Fresh random key.
            pub fn generate() -> Self {
                Self::from_bytes(*random_bytes::<KEY_SIZE>())
            }

            pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
                &self.bytes
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                self.bytes.zeroize();
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("bytes", &"[REDACTED]")
                    .finish()
            }
        }

        impl FixedBytes<KEY_SIZE> for $name {
            fn to_fixed_bytes(&self) -> Zeroizing<[u8; KEY_SIZE]> {
                Zeroizing::new(self.bytes)
            }

            fn from_fixed_bytes(bytes: [u8; KEY_SIZE]) -> anyhow::Result<Self> {
                Ok(Self::from_bytes(bytes))
            }
        }

        base64_serde!($name, KEY_SIZE);
    };
}

symmetric_key!(
    /// 256-bit XChaCha20-Poly1305 key for the record layer.
    SymmetricKey
);

symmetric_key!(
    /// 256-bit key for the keyed-BLAKE3 record MAC.
    MacKey
);

/// An Ed25519 signature over a sealed record or capability token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_SIZE] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }
}

impl FixedBytes<SIGNATURE_SIZE> for Signature {
    fn to_fixed_bytes(&self) -> Zeroizing<[u8; SIGNATURE_SIZE]> {
        Zeroizing::new(self.0)
    }

    fn from_fixed_bytes(bytes: [u8; SIGNATURE_SIZE]) -> anyhow::Result<Self> {
        Ok(Self(bytes))
    }
}

base64_serde!(Signature, SIGNATURE_SIZE);

/// Long-term Ed25519 signing key of a user.
#[derive(Clone)]
pub struct SigningIdentity(SigningKey);

impl SigningIdentity {
    pub fn generate() -> Self {
        Self(SigningKey::from_bytes(&random_bytes::<KEY_SIZE>()))
    }

    pub fn verify_key(&self) -> VerifyKey {
        VerifyKey(self.0.verifying_key())
    }

    pub fn sign(&self, msg: &[u8]) -> Signature {
        Signature(self.0.sign(msg).to_bytes())
    }
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("key", &"[REDACTED]")
            .field("verify_key", &self.verify_key())
            .finish()
    }
}

impl FixedBytes<KEY_SIZE> for SigningIdentity {
    fn to_fixed_bytes(&self) -> Zeroizing<[u8; KEY_SIZE]> {
        Zeroizing::new(self.0.to_bytes())
    }

    fn from_fixed_bytes(bytes: [u8; KEY_SIZE]) -> anyhow::Result<Self> {
        let bytes = Zeroizing::new(bytes);
        Ok(Self(SigningKey::from_bytes(&bytes)))
    }
}

base64_serde!(SigningIdentity, KEY_SIZE);

/// Public half of a [`SigningIdentity`], published in the key directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifyKey(VerifyingKey);

impl VerifyKey {
    /// Parse a directory entry; rejects encodings that are not a curve point.
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let bytes: &[u8; PUBLIC_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("verify key must be {PUBLIC_KEY_SIZE} bytes"))?;
        VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|e| anyhow::anyhow!("invalid verify key: {e}"))
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0.to_bytes()
    }

    /// Strict Ed25519 verification (rejects small-order and malleable signatures).
    pub fn verify(&self, msg: &[u8], signature: &Signature) -> anyhow::Result<()> {
        let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
        self.0
            .verify_strict(msg, &sig)
            .map_err(|_| anyhow::anyhow!("signature verification failed"))
    }
}

/// Long-term X25519 secret; recipients unwrap metadata keys and tokens with it.
#[derive(Clone)]
pub struct DecryptionKey(StaticSecret);

impl DecryptionKey {
    pub fn generate() -> Self {
        Self(StaticSecret::from(*random_bytes::<KEY_SIZE>()))
    }

    pub fn encryption_key(&self) -> EncryptionKey {
        EncryptionKey(X25519PublicKey::from(&self.0))
    }

    pub(crate) fn diffie_hellman(&self, their: &EncryptionKey) -> SharedSecret {
        self.0.diffie_hellman(&their.0)
    }
}

impl std::fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptionKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl FixedBytes<KEY_SIZE> for DecryptionKey {
    fn to_fixed_bytes(&self) -> Zeroizing<[u8; KEY_SIZE]> {
        Zeroizing::new(self.0.to_bytes())
    }

    fn from_fixed_bytes(bytes: [u8; KEY_SIZE]) -> anyhow::Result<Self> {
        Ok(Self(StaticSecret::from(bytes)))
    }
}

base64_serde!(DecryptionKey, KEY_SIZE);

/// X25519 public key, published in the key directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncryptionKey(X25519PublicKey);

impl EncryptionKey {
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let bytes: [u8; PUBLIC_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("encryption key must be {PUBLIC_KEY_SIZE} bytes"))?;
        Ok(Self(X25519PublicKey::from(bytes)))
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0.to_bytes()
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        self.0.as_bytes()
    }
}

//! Base64 helpers for binary fields in JSON records

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zeroize::Zeroizing;

pub fn to_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn from_base64(s: &str) -> anyhow::Result<Vec<u8>> {
    STANDARD
        .decode(s)
        .map_err(|e| anyhow::anyhow!("base64 decode: {e}"))
}

/// Decode into a fixed-size array; the intermediate buffer is zeroized.
pub fn array_from_base64<const N: usize>(s: &str) -> anyhow::Result<[u8; N]> {
    let decoded = Zeroizing::new(from_base64(s)?);
    if decoded.len() != N {
        anyhow::bail!("expected {N} bytes, got {}", decoded.len());
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&decoded);
    Ok(out)
}

/// `#[serde(with = "sfs_crypto::encoding::base64_bytes")]` for `Vec<u8>` fields.
pub mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_base64(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

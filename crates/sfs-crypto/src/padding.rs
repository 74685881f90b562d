//! PKCS#7-style block padding
//!
//! Padding always adds between 1 and `BLOCK_SIZE` bytes, each equal to the
//! pad length, so aligned (and empty) input gains a full block.

use sfs_core::{SfsError, SfsResult};

use crate::BLOCK_SIZE;

pub fn pad(data: &[u8]) -> Vec<u8> {
    let pad_len = BLOCK_SIZE - data.len() % BLOCK_SIZE;
    let mut out = Vec::with_capacity(data.len() + pad_len);
    out.extend_from_slice(data);
    out.resize(data.len() + pad_len, pad_len as u8);
    out
}

/// Strip padding. Empty, unaligned, or inconsistent input is an integrity failure.
pub fn unpad(mut data: Vec<u8>) -> SfsResult<Vec<u8>> {
    if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
        return Err(SfsError::integrity(format!(
            "padded length {} is not a positive multiple of {BLOCK_SIZE}",
            data.len()
        )));
    }

    let pad_len = data[data.len() - 1] as usize;
    if pad_len == 0 || pad_len > BLOCK_SIZE {
        return Err(SfsError::integrity("invalid padding length"));
    }
    let body_len = data.len() - pad_len;
    if data[body_len..].iter().any(|&b| b as usize != pad_len) {
        return Err(SfsError::integrity("inconsistent padding bytes"));
    }

    data.truncate(body_len);
    Ok(data)
}

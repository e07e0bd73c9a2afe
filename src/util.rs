use std::convert::TryInto;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WalletError};

/**
    Converts a slice into a fixed size array.
    Fails with InvalidKeyMaterial if the length does not match.
*/
pub fn try_into<const N: usize>(v: &[u8]) -> Result<[u8; N]> {
    v.try_into()
        .map_err(|_| WalletError::InvalidKeyMaterial(format!("expected {} bytes, found {}", N, v.len())))
}

/**
    Little endian encoding of a diversifier index into the 11 byte
    form used by ZIP-32.
*/
pub fn index_to_le88(index: u64) -> [u8; 11] {
    let mut out = [0u8; 11];
    out[..8].copy_from_slice(&index.to_le_bytes());
    out
}

/**
    Inverse of index_to_le88. Returns None if the index does not fit in a u64.
*/
pub fn le88_to_index(bytes: &[u8; 11]) -> Option<u64> {
    if bytes[8..].iter().any(|b| *b != 0) {
        return None
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&bytes[..8]);
    Some(u64::from_le_bytes(low))
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet
}

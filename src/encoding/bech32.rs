/*
    Module implements bech32 encoding of Sapling addresses and keys.

    Sapling strings use the original Bech32 checksum (not Bech32m) and are
    allowed to exceed the 90 character limit of segwit addresses.
*/
use bech32::{
    Bech32,
    Hrp,
    primitives::decode::{CheckedHrpstring, CheckedHrpstringError}
};

use crate::error::{Result, WalletError};

/// The Bech32 data alphabet
pub const CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/**
    Encodes bytes under the given human readable prefix.
*/
pub fn encode(hrp: &str, data: &[u8]) -> Result<String> {
    let hrp = match Hrp::parse(hrp) {
        Ok(x) => x,
        Err(e) => return Err(WalletError::Encoding(format!("bech32 prefix {:?}: {}", hrp, e)))
    };

    bech32::encode::<Bech32>(hrp, data)
        .map_err(|e| WalletError::Encoding(format!("bech32: {}", e)))
}

/**
    Decodes a Bech32 string into its (lowercase) prefix and data bytes.
*/
pub fn decode(encoded: &str) -> Result<(String, Vec<u8>)> {
    let checked = match CheckedHrpstring::new::<Bech32>(encoded) {
        Ok(x) => x,
        Err(CheckedHrpstringError::Checksum(_)) => return Err(WalletError::ChecksumMismatch),
        Err(e) => return Err(WalletError::Encoding(format!("bech32: {}", e)))
    };

    Ok((checked.hrp().to_lowercase(), checked.byte_iter().collect()))
}

/**
    Decodes a Bech32 string and checks that it carries the expected prefix.
*/
pub fn decode_with_hrp(encoded: &str, expected_hrp: &str) -> Result<Vec<u8>> {
    let (hrp, data) = decode(encoded)?;
    if hrp != expected_hrp {
        return Err(WalletError::NetworkMismatch {
            expected: expected_hrp.to_string(),
            found: hrp
        })
    }

    Ok(data)
}

/**
    Returns the data characters following the separator, checksum included.
*/
pub fn data_part(encoded: &str) -> &str {
    match encoded.rfind('1') {
        Some(i) => &encoded[i + 1..],
        None => ""
    }
}

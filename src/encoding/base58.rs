use crate::{
    bs58,
    error::{Result, WalletError},
    hash
};

const CHECKSUM_LEN: usize = 4;

/**
    A version prefix and payload awaiting Base58Check encoding.
*/
#[derive(Debug)]
pub struct Base58 {
    prefix: Vec<u8>,
    payload: Vec<u8>
}

impl Base58 {
    pub fn new(prefix: &[u8], payload: &[u8]) -> Base58 {
        Base58 {
            prefix: prefix.to_vec(),
            payload: payload.to_vec()
        }
    }

    /// Check encode data by appending the checksum and then encoding it.
    pub fn check_encode(&self) -> String {
        //Concatenate: prefix | payload | checksum
        let mut bytes: Vec<u8> = self.prefix.clone();
        bytes.extend_from_slice(&self.payload);
        let checksum = hash::sha256d(&bytes);
        bytes.extend_from_slice(&checksum[..CHECKSUM_LEN]);

        bs58::encode(bytes).into_string()
    }

    /// Encode data in base58 format without a checksum.
    pub fn encode(&self) -> String {
        let mut bytes: Vec<u8> = self.prefix.clone();
        bytes.extend_from_slice(&self.payload);
        bs58::encode(bytes).into_string()
    }

    /// Decodes a base58 string into a byte vector.
    /// DOES NOT remove the checksum or version prefix if present.
    pub fn decode(encoded: &str) -> Result<Vec<u8>> {
        match bs58::decode(encoded).into_vec() {
            Ok(x) => Ok(x),
            Err(e) => Err(WalletError::Encoding(format!("base58: {}", e)))
        }
    }

    /// Returns the decoded bytes with the checksum removed.
    /// Version prefix is NOT removed as it is variable length depending on context.
    pub fn check_decode(encoded: &str) -> Result<Vec<u8>> {
        let mut bytes = Self::decode(encoded)?;
        if bytes.len() < CHECKSUM_LEN {
            return Err(WalletError::Encoding("base58check: input too short".to_string()))
        }

        //Check derived_checksum == extracted_checksum
        let split = bytes.len() - CHECKSUM_LEN;
        if hash::sha256d(&bytes[..split])[..CHECKSUM_LEN] != bytes[split..] {
            return Err(WalletError::ChecksumMismatch)
        }

        bytes.truncate(split);
        Ok(bytes)
    }

    /// Returns the decoded payload with both checksum and the expected prefix removed.
    /// A different prefix means the string belongs to another network or key type.
    pub fn check_decode_with_prefix(encoded: &str, prefix: &[u8]) -> Result<Vec<u8>> {
        let bytes = Self::check_decode(encoded)?;
        if bytes.len() < prefix.len() || &bytes[..prefix.len()] != prefix {
            let found = &bytes[..prefix.len().min(bytes.len())];
            return Err(WalletError::NetworkMismatch {
                expected: hex::encode(prefix),
                found: hex::encode(found)
            })
        }

        Ok(bytes[prefix.len()..].to_vec())
    }
}

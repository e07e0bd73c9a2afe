use std::fmt;
use zeroize::Zeroizing;

use crate::{
    Secp256k1,
    PublicKey,
    SecretKey,
    address::TransparentAddress,
    encoding::base58::Base58,
    entropy::EntropySource,
    error::{Result, WalletError},
    hash,
    params::CoinParams
};

/// Draws before rejection sampling gives up on a broken entropy source.
/// An honest source is rejected with probability below 2^-127 per draw.
pub const MAX_SCALAR_DRAWS: usize = 128;

/// WIF suffix marking a key whose public key is used compressed.
const COMPRESSED_SUFFIX: u8 = 0x01;

pub struct PrivKey(SecretKey);

impl PrivKey {

    /**
        Draws 32 bytes from the entropy source until they form a valid secp256k1
        scalar in [1, n-1]. Out of range draws are discarded and redrawn.
    */
    pub fn generate(source: &dyn EntropySource) -> Result<Self> {
        for _ in 0..MAX_SCALAR_DRAWS {
            let bytes = source.next_bytes(32)?;
            match SecretKey::from_slice(&bytes) {
                Ok(k) => return Ok(Self(k)),
                Err(_) => tracing::trace!("rejected out of range scalar, redrawing")
            }
        }

        Err(WalletError::InvalidKeyMaterial(format!(
            "entropy source produced {} out of range scalars in a row", MAX_SCALAR_DRAWS
        )))
    }

    /**
        Use a predefined byte array as a secret key.
    */
    pub fn from_slice(byte_array: &[u8]) -> Result<Self> {
        match SecretKey::from_slice(byte_array) {
            Ok(k) => Ok(Self(k)),
            Err(_) => Err(WalletError::InvalidKeyMaterial("secret key must be 32 bytes in [1, n-1]".to_string()))
        }
    }

    /**
        Serializes the private key into a array of bytes.
    */
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.0.secret_bytes())
    }

    /*
        Export the private key in wallet-import-format (Base58Check encoded with prefix).
        Keys are always exported with the compression byte.
    */
    pub fn export_as_wif(&self, params: &CoinParams) -> String {
        let mut key = Zeroizing::new(self.0.secret_bytes().to_vec());
        key.push(COMPRESSED_SUFFIX);

        Base58::new(&[params.tsecret_prefix], &key).check_encode()
    }

    /**
        Import a private key from WIF. Only compressed keys are accepted.
    */
    pub fn from_wif(wif: &str, params: &CoinParams) -> Result<Self> {
        let payload = Zeroizing::new(Base58::check_decode_with_prefix(wif, &[params.tsecret_prefix])?);
        if payload.len() != 33 || payload[32] != COMPRESSED_SUFFIX {
            return Err(WalletError::InvalidKeyMaterial(format!(
                "expected a compressed WIF payload of 33 bytes, found {}", payload.len()
            )))
        }

        Self::from_slice(&payload[..32])
    }
}

impl Drop for PrivKey {
    fn drop(&mut self) {
        self.0.non_secure_erase();
    }
}

impl Clone for PrivKey {
    fn clone(&self) -> Self {
        Self(self.0)
    }
}

impl PartialEq for PrivKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl fmt::Debug for PrivKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PrivKey(<redacted>)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PubKey(PublicKey);

impl PubKey {

    /**
        Finds the compressed public key from a secret key.

        Is the result of static point G on the secp256k1 curve multipled k times, where k is the private key.
    */
    pub fn from_priv_key(k: &PrivKey) -> Self {
        Self(PublicKey::from_secret_key(&Secp256k1::signing_only(), &k.0))
    }

    /**
        Use a predefined byte array as a public key.
    */
    pub fn from_slice(byte_array: &[u8]) -> Result<Self> {
        match PublicKey::from_slice(byte_array) {
            Ok(k) => Ok(Self(k)),
            Err(_) => Err(WalletError::InvalidKeyMaterial("not a valid secp256k1 point".to_string()))
        }
    }

    /**
        Returns the compressed public key as a byte array.
    */
    pub fn as_bytes(&self) -> [u8; 33] {
        //Len should be 33 (32bytes + sign identifier)
        self.0.serialize()
    }

    /**
        Ripemd160( Sha256( compressed public key ) )
    */
    pub fn hash160(&self) -> [u8; 20] {
        hash::hash160(self.as_bytes())
    }
}

/**
    A transparent private key together with its compressed public key.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct TransparentKeyPair {
    private_key: PrivKey,
    public_key: PubKey
}

impl TransparentKeyPair {
    pub fn generate(source: &dyn EntropySource) -> Result<Self> {
        Ok(Self::from_private_key(PrivKey::generate(source)?))
    }

    pub fn from_private_key(private_key: PrivKey) -> Self {
        let public_key = PubKey::from_priv_key(&private_key);
        Self { private_key, public_key }
    }

    pub fn private_key(&self) -> &PrivKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &PubKey {
        &self.public_key
    }

    pub fn address(&self) -> TransparentAddress {
        TransparentAddress::from_pub_key(&self.public_key)
    }
}

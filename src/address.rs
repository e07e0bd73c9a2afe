use crate::{
    key::PubKey,
    encoding::base58::Base58,
    error::{Result, WalletError},
    params::CoinParams,
    util::try_into
};

/**
    A transparent P2PKH address, held as the hash160 of the public key.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransparentAddress {
    hash: [u8; 20]
}

impl TransparentAddress {
    /**
        Creates a wallet address from a compressed public key.
        * Base58Check( version || Ripemd160( Sha256( Public Key ) ) )
    */
    pub fn from_pub_key(pk: &PubKey) -> Self {
        Self { hash: pk.hash160() }
    }

    pub fn from_hash(hash: [u8; 20]) -> Self {
        Self { hash }
    }

    pub fn hash(&self) -> &[u8; 20] {
        &self.hash
    }

    /**
        Encodes the address with the coin's transparent version bytes.
    */
    pub fn encode(&self, params: &CoinParams) -> String {
        Base58::new(&params.taddress_version, &self.hash).check_encode()
    }

    /**
        Decodes an address, checking checksum, version bytes and payload length.
    */
    pub fn decode(address: &str, params: &CoinParams) -> Result<Self> {
        let payload = Base58::check_decode_with_prefix(address, &params.taddress_version)?;
        if payload.len() != 20 {
            return Err(WalletError::Encoding(format!("expected a 20 byte address hash, found {}", payload.len())))
        }

        Ok(Self { hash: try_into(&payload)? })
    }

    /**
        Verifies that an address is valid by checking the payload and checksum
    */
    pub fn is_valid(address: &str, params: &CoinParams) -> bool {
        Self::decode(address, params).is_ok()
    }
}

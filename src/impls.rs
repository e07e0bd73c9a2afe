/**
    This module combines all the boilerplate
    implementations of fmt::Display and more.
*/

use crate::{
    address,
    key,
    params,
    record,
    shielded,
    util,
    wallet_key
};
use std::fmt;

/*
    util module impls
*/
impl fmt::Display for util::Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let val = match self {
            Self::Mainnet => "main",
            Self::Testnet => "test"
        };

        write!(f, "{}", val)
    }
}

/*
    key module impls
*/
impl fmt::Display for key::PubKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_bytes()))
    }
}

/*
    address module impls
*/
impl fmt::Display for address::TransparentAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.hash()))
    }
}

/*
    params module impls
*/
impl fmt::Display for params::CoinParams {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.network_id())
    }
}

/*
    wallet_key module impls
*/
impl fmt::Display for wallet_key::AddressType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let val = match self {
            Self::Transparent => "transparent",
            Self::Shielded => "shielded"
        };

        write!(f, "{}", val)
    }
}

/*
    record module impls
*/
impl fmt::Display for record::KeyText {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/*
    shielded module impls
*/
impl fmt::Display for shielded::address::Diversifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names() {
        assert_eq!(util::Network::Mainnet.to_string(), "main");
        assert_eq!(util::Network::Testnet.to_string(), "test");
        assert_eq!(wallet_key::AddressType::Shielded.to_string(), "shielded");
        assert_eq!(params::CoinParams::testnet().to_string(), "zcash-test");
        assert_eq!(record::KeyText::Encrypted("6Pabc".to_string()).to_string(), "6Pabc");
        assert_eq!(shielded::address::Diversifier([0xab; 11]).to_string(), "ab".repeat(11));
    }
}

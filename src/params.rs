/*
    Per-coin, per-network encoding parameters.

    Version bytes and Bech32 prefixes are configuration rather than constants
    so that Zcash forks (Hush, etc.) can be targeted by loading a JSON file.
    The mainnet and testnet presets match the live Zcash networks.
*/

use std::{fs, path::Path};
use serde::{Deserialize, Serialize};
use bech32::Hrp;

use crate::{
    error::{Result, WalletError},
    util::Network
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinParams {
    /// Display name, e.g. "zcash"
    pub name: String,
    pub network: Network,
    /// Base58Check version bytes of a transparent P2PKH address
    pub taddress_version: Vec<u8>,
    /// WIF prefix byte of a transparent secret key
    pub tsecret_prefix: u8,
    /// Bech32 prefix of a Sapling payment address
    pub zaddress_hrp: String,
    /// Bech32 prefix of a Sapling extended spending key
    pub zsecret_hrp: String,
    /// Bech32 prefix of a Sapling extended full viewing key
    pub zviewkey_hrp: String,
    /// ZIP-32 coin type
    pub coin_type: u32,
    /// Payment URI scheme used for scannable address codes
    #[serde(default)]
    pub uri_scheme: Option<String>,
}

impl CoinParams {
    pub fn mainnet() -> Self {
        Self {
            name: "zcash".to_string(),
            network: Network::Mainnet,
            taddress_version: vec![0x1C, 0xB8],
            tsecret_prefix: 0x80,
            zaddress_hrp: "zs".to_string(),
            zsecret_hrp: "secret-extended-key-main".to_string(),
            zviewkey_hrp: "zxviews".to_string(),
            coin_type: 133,
            uri_scheme: Some("zcash".to_string())
        }
    }

    pub fn testnet() -> Self {
        Self {
            name: "zcash".to_string(),
            network: Network::Testnet,
            taddress_version: vec![0x1D, 0x25],
            tsecret_prefix: 0xEF,
            zaddress_hrp: "ztestsapling".to_string(),
            zsecret_hrp: "secret-extended-key-test".to_string(),
            zviewkey_hrp: "zxviewtestsapling".to_string(),
            coin_type: 1,
            uri_scheme: Some("zcash".to_string())
        }
    }

    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => Self::mainnet(),
            Network::Testnet => Self::testnet()
        }
    }

    /**
        Parses and validates parameters from JSON.
    */
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /**
        Checks that every prefix can actually be used for encoding.
    */
    pub fn validate(&self) -> Result<()> {
        if self.taddress_version.is_empty() {
            return Err(WalletError::InvalidParams("transparent address version is empty".to_string()))
        }
        if self.taddress_version.len() == 1 && self.taddress_version[0] == self.tsecret_prefix {
            return Err(WalletError::InvalidParams("address and secret key prefixes collide".to_string()))
        }

        for hrp in [&self.zaddress_hrp, &self.zsecret_hrp, &self.zviewkey_hrp, &self.encrypted_zsecret_hrp()] {
            if let Err(e) = Hrp::parse(hrp) {
                return Err(WalletError::InvalidParams(format!("bad bech32 prefix {:?}: {}", hrp, e)))
            }
            if hrp.chars().any(|c| c.is_ascii_uppercase()) {
                return Err(WalletError::InvalidParams(format!("bech32 prefix {:?} must be lowercase", hrp)))
            }
        }

        let mut hrps = vec![&self.zaddress_hrp, &self.zsecret_hrp, &self.zviewkey_hrp];
        hrps.sort();
        hrps.dedup();
        if hrps.len() != 3 {
            return Err(WalletError::InvalidParams("bech32 prefixes must be distinct".to_string()))
        }

        if self.coin_type >= 1 << 31 {
            return Err(WalletError::InvalidParams(format!("coin type {} is not a valid hardened index", self.coin_type)))
        }

        Ok(())
    }

    /// Bech32 prefix of a passphrase encrypted extended spending key
    pub fn encrypted_zsecret_hrp(&self) -> String {
        format!("{}-encrypted", self.zsecret_hrp)
    }

    /// Human readable network id, e.g. "zcash-main"
    pub fn network_id(&self) -> String {
        format!("{}-{}", self.name, self.network)
    }
}

impl Default for CoinParams {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HUSH_JSON: &str = r#"{
        "name": "hush",
        "network": "mainnet",
        "taddress_version": [28, 184],
        "tsecret_prefix": 188,
        "zaddress_hrp": "zs",
        "zsecret_hrp": "secret-extended-key-main",
        "zviewkey_hrp": "zviews",
        "coin_type": 133
    }"#;

    #[test]
    fn presets_are_valid() {
        CoinParams::mainnet().validate().unwrap();
        CoinParams::testnet().validate().unwrap();
        assert_eq!(CoinParams::for_network(Network::Testnet).coin_type, 1);
        assert_eq!(CoinParams::mainnet().network_id(), "zcash-main");
    }

    #[test]
    fn load_custom_coin() {
        let hush = CoinParams::from_json(HUSH_JSON).unwrap();
        assert_eq!(hush.tsecret_prefix, 0xBC);
        assert_eq!(hush.zviewkey_hrp, "zviews");
        assert_eq!(hush.uri_scheme, None);
        assert_eq!(hush.encrypted_zsecret_hrp(), "secret-extended-key-main-encrypted");
    }

    #[test]
    fn reject_bad_params() {
        let mut p = CoinParams::mainnet();
        p.zaddress_hrp = "z s".to_string();
        assert!(matches!(p.validate(), Err(WalletError::InvalidParams(_))));

        let mut p = CoinParams::mainnet();
        p.zviewkey_hrp = p.zaddress_hrp.clone();
        assert!(p.validate().is_err());

        let mut p = CoinParams::mainnet();
        p.taddress_version = vec![];
        assert!(p.validate().is_err());

        assert!(matches!(CoinParams::from_json("{}"), Err(WalletError::Json(_))));
    }
}

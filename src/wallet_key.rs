use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    key::TransparentKeyPair,
    params::CoinParams,
    shielded::ShieldedKeys
};

/// Address pool of a wallet entry
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    Transparent,
    Shielded
}

/**
    Key material of one wallet entry, in either address pool.
*/
#[derive(Debug, Clone)]
pub enum WalletKey {
    Transparent(TransparentKeyPair),
    Shielded(ShieldedKeys)
}

impl WalletKey {
    pub fn address_type(&self) -> AddressType {
        match self {
            Self::Transparent(_) => AddressType::Transparent,
            Self::Shielded(_) => AddressType::Shielded
        }
    }

    pub fn address_text(&self, params: &CoinParams) -> Result<String> {
        match self {
            Self::Transparent(k) => Ok(k.address().encode(params)),
            Self::Shielded(k) => k.address_text(params)
        }
    }

    /**
        WIF for transparent keys, the Bech32 extended spending key for shielded keys.
    */
    pub fn private_key_text(&self, params: &CoinParams) -> Result<String> {
        match self {
            Self::Transparent(k) => Ok(k.private_key().export_as_wif(params)),
            Self::Shielded(k) => k.spending_key_text(params)
        }
    }

    pub fn viewing_key_text(&self, params: &CoinParams) -> Result<Option<String>> {
        match self {
            Self::Transparent(_) => Ok(None),
            Self::Shielded(k) => Ok(Some(k.viewing_key_text(params)?))
        }
    }

    pub fn derivation_path(&self) -> Option<String> {
        match self {
            Self::Transparent(_) => None,
            Self::Shielded(k) => k.path().map(|p| p.to_string())
        }
    }
}

impl From<TransparentKeyPair> for WalletKey {
    fn from(k: TransparentKeyPair) -> Self {
        Self::Transparent(k)
    }
}

impl From<ShieldedKeys> for WalletKey {
    fn from(k: ShieldedKeys) -> Self {
        Self::Shielded(k)
    }
}

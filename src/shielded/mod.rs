/*
    Sapling shielded keys.

    A shielded wallet entry is the ZIP-32 extended spending key at
    m/32'/coin_type'/account', its extended full viewing key and the
    payment address at the first valid diversifier index.
*/

pub mod address;
pub mod keys;
pub mod path;

use crate::{
    entropy::Seed,
    error::Result,
    params::CoinParams,
    shielded::{
        address::PaymentAddress,
        keys::{ExtendedFullViewingKey, ExtendedSpendingKey},
        path::Path
    }
};

#[derive(Debug, Clone)]
pub struct ShieldedKeys {
    spending_key: ExtendedSpendingKey,
    viewing_key: ExtendedFullViewingKey,
    diversifier_index: u64,
    address: PaymentAddress,
    path: Option<Path>
}

impl ShieldedKeys {
    /**
        Derives the account key of a seed and its default address.
    */
    pub fn derive(seed: &Seed, params: &CoinParams, account: u32) -> Result<Self> {
        let path = Path::sapling_account(params.coin_type, account)?;
        let spending_key = ExtendedSpendingKey::from_path(seed, &path)?;

        let mut keys = Self::from_spending_key(spending_key)?;
        keys.path = Some(path);
        Ok(keys)
    }

    /**
        Wraps an existing extended spending key. The path is unknown.
    */
    pub fn from_spending_key(spending_key: ExtendedSpendingKey) -> Result<Self> {
        let viewing_key = spending_key.to_extended_full_viewing_key()?;
        let (diversifier_index, address) = viewing_key.default_address()?;

        Ok(Self { spending_key, viewing_key, diversifier_index, address, path: None })
    }

    /**
        The same keys with the address moved to the first valid diversifier
        at or after index start.
    */
    pub fn at_index(&self, start: u64) -> Result<Self> {
        let (diversifier_index, address) = self.viewing_key.find_address(start)?;

        Ok(Self {
            spending_key: self.spending_key.clone(),
            viewing_key: self.viewing_key.clone(),
            diversifier_index,
            address,
            path: self.path.clone()
        })
    }

    pub fn spending_key(&self) -> &ExtendedSpendingKey {
        &self.spending_key
    }

    pub fn viewing_key(&self) -> &ExtendedFullViewingKey {
        &self.viewing_key
    }

    pub fn diversifier_index(&self) -> u64 {
        self.diversifier_index
    }

    pub fn address(&self) -> &PaymentAddress {
        &self.address
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    pub fn address_text(&self, params: &CoinParams) -> Result<String> {
        self.address.encode(params)
    }

    pub fn spending_key_text(&self, params: &CoinParams) -> Result<String> {
        self.spending_key.encode(params)
    }

    pub fn viewing_key_text(&self, params: &CoinParams) -> Result<String> {
        self.viewing_key.encode(params)
    }
}

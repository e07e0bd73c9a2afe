/*
    Sapling payment addresses.

    An address is a diversifier d (11 bytes) and a transmission key
    pk_d = [ivk] g_d, where g_d = DiversifyHash(d). Only about half of all
    diversifiers hash to a usable point, so diversifier indexes are searched
    in order until one is valid.
*/

use aes::Aes256;
use fpe::ff1::{BinaryNumeralString, FF1};
use group::{cofactor::CofactorGroup, Group, GroupEncoding};
use jubjub::{ExtendedPoint, Fr, SubgroupPoint};
use std::fmt;
use zeroize::Zeroize;

use crate::{
    encoding::bech32,
    error::{Result, WalletError},
    hash,
    params::CoinParams,
    util::{index_to_le88, le88_to_index, try_into}
};

/// GroupHash personalisation for DiversifyHash
const DIVERSIFY_HASH_PERSONALIZATION: &[u8; 8] = b"Zcash_gd";

/// First block of every GroupHash input (the uniform random string)
const GH_FIRST_BLOCK: &[u8; 64] = b"096b36a5804bfacef1691e173c366a47ff5ba84a44f26ddd7e8d9f79d5b42df0";

/// Length of an encoded payment address
pub const PAYMENT_ADDRESS_LENGTH: usize = 43;

/// Diversifier indexes tried before giving up with DiversifierExhausted
pub const MAX_DIVERSIFIER_ATTEMPTS: u64 = 256;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Diversifier(pub [u8; 11]);

impl Diversifier {
    /**
        DiversifyHash(d). None if d does not hash to a usable point.
    */
    pub fn g_d(&self) -> Option<SubgroupPoint> {
        let h = hash::blake2s_personal(DIVERSIFY_HASH_PERSONALIZATION, &[&GH_FIRST_BLOCK[..], &self.0[..]]);

        let p: Option<ExtendedPoint> = ExtendedPoint::from_bytes(&h).into();
        let p = p?.clear_cofactor();
        if bool::from(p.is_identity()) {
            return None
        }

        Some(p)
    }

    /// Validity predicate: d has a diversified base point
    pub fn is_valid(&self) -> bool {
        self.g_d().is_some()
    }
}

impl fmt::Debug for Diversifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Diversifier({})", hex::encode(self.0))
    }
}

/**
    The diversifier key dk. Diversifier j is FF1-AES256 of j under dk.
*/
#[derive(Clone, PartialEq, Eq)]
pub struct DiversifierKey(pub(crate) [u8; 32]);

impl DiversifierKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn ff1(&self) -> Result<FF1<Aes256>> {
        FF1::<Aes256>::new(&self.0, 2)
            .map_err(|e| WalletError::InvalidKeyMaterial(format!("diversifier key: {:?}", e)))
    }

    /**
        The diversifier at index j, whether or not it is valid.
    */
    pub fn diversifier(&self, index: u64) -> Result<Diversifier> {
        let enc = self.ff1()?
            .encrypt(&[], &BinaryNumeralString::from_bytes_le(&index_to_le88(index)))
            .map_err(|e| WalletError::InvalidKeyMaterial(format!("diversifier: {:?}", e)))?;

        Ok(Diversifier(try_into(&enc.to_bytes_le())?))
    }

    /**
        Recovers the index a diversifier was produced from.
        None if the index does not fit in a u64.
    */
    pub fn diversifier_index(&self, d: &Diversifier) -> Result<Option<u64>> {
        let dec = self.ff1()?
            .decrypt(&[], &BinaryNumeralString::from_bytes_le(&d.0))
            .map_err(|e| WalletError::InvalidKeyMaterial(format!("diversifier: {:?}", e)))?;

        Ok(le88_to_index(&try_into(&dec.to_bytes_le())?))
    }

    /**
        Searches indexes start, start+1, ... for the first valid diversifier.
        Gives up after MAX_DIVERSIFIER_ATTEMPTS indexes.
    */
    pub fn find_diversifier(&self, start: u64) -> Result<(u64, Diversifier)> {
        for index in start..start.saturating_add(MAX_DIVERSIFIER_ATTEMPTS) {
            let d = self.diversifier(index)?;
            if d.is_valid() {
                return Ok((index, d))
            }
        }

        Err(WalletError::DiversifierExhausted(MAX_DIVERSIFIER_ATTEMPTS))
    }
}

impl Drop for DiversifierKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for DiversifierKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DiversifierKey(<redacted>)")
    }
}

#[derive(Clone, Copy)]
pub struct PaymentAddress {
    diversifier: Diversifier,
    pk_d: SubgroupPoint
}

impl PaymentAddress {
    /**
        pk_d = [ivk] g_d. Fails if d is not a valid diversifier.
    */
    pub fn from_ivk(ivk: &Fr, diversifier: Diversifier) -> Result<Self> {
        let g_d = match diversifier.g_d() {
            Some(x) => x,
            None => return Err(WalletError::InvalidKeyMaterial("diversifier has no base point".to_string()))
        };
        let pk_d = g_d * ivk;
        if bool::from(pk_d.is_identity()) {
            return Err(WalletError::InvalidKeyMaterial("transmission key is the identity".to_string()))
        }

        Ok(Self { diversifier, pk_d })
    }

    pub fn diversifier(&self) -> &Diversifier {
        &self.diversifier
    }

    pub fn pk_d(&self) -> &SubgroupPoint {
        &self.pk_d
    }

    /// d || repr(pk_d)
    pub fn to_bytes(&self) -> [u8; PAYMENT_ADDRESS_LENGTH] {
        let mut bytes = [0u8; PAYMENT_ADDRESS_LENGTH];
        bytes[..11].copy_from_slice(&self.diversifier.0);
        bytes[11..].copy_from_slice(&self.pk_d.to_bytes());
        bytes
    }

    /**
        Parses an address, checking that d is valid and pk_d is a non-identity
        point of the prime order subgroup.
    */
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PAYMENT_ADDRESS_LENGTH {
            return Err(WalletError::Encoding(format!(
                "expected a {} byte payment address, found {}", PAYMENT_ADDRESS_LENGTH, bytes.len()
            )))
        }

        let diversifier = Diversifier(try_into(&bytes[..11])?);
        if !diversifier.is_valid() {
            return Err(WalletError::InvalidKeyMaterial("invalid diversifier".to_string()))
        }

        let repr: [u8; 32] = try_into(&bytes[11..])?;
        let pk_d: Option<SubgroupPoint> = SubgroupPoint::from_bytes(&repr).into();
        match pk_d {
            Some(pk_d) if !bool::from(pk_d.is_identity()) => Ok(Self { diversifier, pk_d }),
            _ => Err(WalletError::InvalidKeyMaterial("invalid transmission key".to_string()))
        }
    }

    pub fn encode(&self, params: &CoinParams) -> Result<String> {
        bech32::encode(&params.zaddress_hrp, &self.to_bytes())
    }

    pub fn decode(address: &str, params: &CoinParams) -> Result<Self> {
        Self::from_bytes(&bech32::decode_with_hrp(address, &params.zaddress_hrp)?)
    }
}

impl PartialEq for PaymentAddress {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PaymentAddress {}

impl fmt::Debug for PaymentAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PaymentAddress({})", hex::encode(self.to_bytes()))
    }
}

/*
    ZIP-32 extended Sapling keys.

    Only hardened derivation is implemented, which is all the
    m/32'/coin_type'/account' wallet layout needs. Serialized forms are the
    169 byte encodings used by zcashd and every Sapling light wallet.

    References:
        - ZIP-32, Shielded Hierarchical Deterministic Wallets
          (https://zips.z.cash/zip-0032)
        - Zcash protocol specification, section 4.2.2 Sapling Key Components
*/

use ff::Field;
use group::{Group, GroupEncoding};
use jubjub::{Fr, SubgroupPoint};
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

use crate::{
    encoding::bech32,
    entropy::Seed,
    error::{Result, WalletError},
    hash,
    params::CoinParams,
    shielded::{
        address::{DiversifierKey, PaymentAddress},
        path::{ChildOptions, Path, HARDENED_OFFSET}
    },
    util::try_into
};

/// Personalisation of the ZIP-32 Sapling master key hash
const MASTER_PERSONALIZATION: &[u8; 16] = b"ZcashIP32Sapling";
/// Personalisation of the full viewing key fingerprint
const FVFP_PERSONALIZATION: &[u8; 16] = b"ZcashSaplingFVFP";
/// Personalisation of CRH^ivk
const CRH_IVK_PERSONALIZATION: &[u8; 8] = b"Zcashivk";

/// Length of a serialized extended key
pub const EXTENDED_KEY_LENGTH: usize = 169;

/// Compressed SpendAuthSig base point, group_hash("Zcash_G_", "")
const SPENDING_KEY_GENERATOR: [u8; 32] = [
    0x30, 0xb5, 0xf2, 0xaa, 0xad, 0x32, 0x56, 0x30, 0xbc, 0xdd, 0xdb, 0xce, 0x4d, 0x67, 0x65, 0x6d,
    0x05, 0xfd, 0x1c, 0xc2, 0xd0, 0x37, 0xbb, 0x53, 0x75, 0xb6, 0xe9, 0x6d, 0x9e, 0x01, 0xa1, 0xd7,
];

/// Compressed proof generation key base point, group_hash("Zcash_H_", "")
const PROOF_GENERATION_KEY_GENERATOR: [u8; 32] = [
    0xe7, 0xe8, 0x5d, 0xe0, 0xf7, 0xf9, 0x7a, 0x46, 0xd2, 0x49, 0xa1, 0xf5, 0xea, 0x51, 0xdf, 0x50,
    0xcc, 0x48, 0x49, 0x0f, 0x84, 0x01, 0xc9, 0xde, 0x7a, 0x2a, 0xdf, 0x18, 0x07, 0xd1, 0xb6, 0xd4,
];

//PRF^expand domain separators
const DOMAIN_ASK: u8 = 0x00;
const DOMAIN_NSK: u8 = 0x01;
const DOMAIN_OVK: u8 = 0x02;
const DOMAIN_DK: u8 = 0x10;
const DOMAIN_CHILD: u8 = 0x11;
const DOMAIN_CHILD_ASK: u8 = 0x13;
const DOMAIN_CHILD_NSK: u8 = 0x14;
const DOMAIN_CHILD_OVK: u8 = 0x15;
const DOMAIN_CHILD_DK: u8 = 0x16;

fn generator(bytes: &[u8; 32]) -> Result<SubgroupPoint> {
    let p: Option<SubgroupPoint> = SubgroupPoint::from_bytes(bytes).into();
    p.ok_or_else(|| WalletError::InvalidKeyMaterial("bad generator encoding".to_string()))
}

fn to_scalar(bytes: &[u8; 64]) -> Fr {
    Fr::from_bytes_wide(bytes)
}

fn truncate_32(bytes: &[u8; 64]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes[..32]);
    out
}

fn scalar_from_bytes(bytes: &[u8]) -> Result<Fr> {
    let repr: [u8; 32] = try_into(bytes)?;
    let s: Option<Fr> = Fr::from_bytes(&repr).into();
    match s {
        Some(s) if !bool::from(s.is_zero()) => Ok(s),
        _ => Err(WalletError::InvalidKeyMaterial("non-canonical or zero scalar".to_string()))
    }
}

fn point_from_bytes(bytes: &[u8]) -> Result<SubgroupPoint> {
    let repr: [u8; 32] = try_into(bytes)?;
    let p: Option<SubgroupPoint> = SubgroupPoint::from_bytes(&repr).into();
    match p {
        Some(p) if !bool::from(p.is_identity()) => Ok(p),
        _ => Err(WalletError::InvalidKeyMaterial("point is not a non-identity subgroup element".to_string()))
    }
}

/**
    Depth, parent fingerprint tag and child index shared by both extended keys.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KeyHeader {
    depth: u8,
    parent_fvk_tag: [u8; 4],
    child_index: u32
}

impl KeyHeader {
    fn master() -> Self {
        Self { depth: 0, parent_fvk_tag: [0u8; 4], child_index: 0 }
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.push(self.depth);
        out.extend_from_slice(&self.parent_fvk_tag);
        out.extend_from_slice(&self.child_index.to_le_bytes());
    }

    fn read(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            depth: bytes[0],
            parent_fvk_tag: try_into(&bytes[1..5])?,
            child_index: u32::from_le_bytes(try_into(&bytes[5..9])?)
        })
    }
}

/**
    A Sapling full viewing key (ak, nk, ovk).
*/
#[derive(Clone, Copy, PartialEq)]
pub struct FullViewingKey {
    ak: SubgroupPoint,
    nk: SubgroupPoint,
    ovk: [u8; 32]
}

impl FullViewingKey {
    pub fn to_bytes(&self) -> [u8; 96] {
        let mut out = [0u8; 96];
        out[..32].copy_from_slice(&self.ak.to_bytes());
        out[32..64].copy_from_slice(&self.nk.to_bytes());
        out[64..].copy_from_slice(&self.ovk);
        out
    }

    /**
        BLAKE2b-256("ZcashSaplingFVFP", ak || nk || ovk)
    */
    pub fn fingerprint(&self) -> [u8; 32] {
        hash::blake2b_personal::<32>(FVFP_PERSONALIZATION, &[&self.to_bytes()[..]])
    }

    /**
        ivk = CRH^ivk(ak, nk), truncated to 251 bits.
    */
    pub fn ivk(&self) -> Result<Fr> {
        let mut h = hash::blake2s_personal(CRH_IVK_PERSONALIZATION, &[&self.ak.to_bytes()[..], &self.nk.to_bytes()[..]]);
        h[31] &= 0b0000_0111;

        scalar_from_bytes(&h)
    }
}

/**
    A ZIP-32 extended spending key.
*/
#[derive(Clone)]
pub struct ExtendedSpendingKey {
    header: KeyHeader,
    chain_code: [u8; 32],
    ask: Fr,
    nsk: Fr,
    ovk: [u8; 32],
    dk: DiversifierKey
}

impl ExtendedSpendingKey {
    /**
        Master key from a seed.
        I = BLAKE2b-512("ZcashIP32Sapling", seed), sk = I_L, c = I_R
    */
    pub fn master(seed: &Seed) -> Self {
        let i = Zeroizing::new(hash::blake2b_personal::<64>(MASTER_PERSONALIZATION, &[seed.as_bytes()]));
        let sk = Zeroizing::new(truncate_32(&i));
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&i[32..]);

        Self {
            header: KeyHeader::master(),
            chain_code,
            ask: to_scalar(&hash::prf_expand(&*sk, &[&[DOMAIN_ASK][..]])),
            nsk: to_scalar(&hash::prf_expand(&*sk, &[&[DOMAIN_NSK][..]])),
            ovk: truncate_32(&hash::prf_expand(&*sk, &[&[DOMAIN_OVK][..]])),
            dk: DiversifierKey(truncate_32(&hash::prf_expand(&*sk, &[&[DOMAIN_DK][..]])))
        }
    }

    /**
        Walks a path from the master key of the seed.
    */
    pub fn from_path(seed: &Seed, path: &Path) -> Result<Self> {
        let mut key = Self::master(seed);
        for child in &path.children {
            key = key.derive_child(*child)?;
        }

        Ok(key)
    }

    /**
        Hardened child key derivation (CKDsk).
        Non-hardened derivation of spending keys is not supported.
    */
    pub fn derive_child(&self, child: ChildOptions) -> Result<Self> {
        let index = child.index()?;
        if index < HARDENED_OFFSET {
            return Err(WalletError::BadPath("non-hardened Sapling derivation is not supported".to_string()))
        }
        let depth = match self.header.depth.checked_add(1) {
            Some(x) => x,
            None => return Err(WalletError::BadPath("maximum derivation depth reached".to_string()))
        };

        let parts = self.expanded_parts();
        let i = Zeroizing::new(hash::prf_expand(
            &self.chain_code,
            &[&[DOMAIN_CHILD][..], &parts[..], &index.to_le_bytes()[..]]
        ));
        let i_l = Zeroizing::new(truncate_32(&i));
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&i[32..]);

        let mut parent_fvk_tag = [0u8; 4];
        parent_fvk_tag.copy_from_slice(&self.to_full_viewing_key()?.fingerprint()[..4]);

        Ok(Self {
            header: KeyHeader { depth, parent_fvk_tag, child_index: index },
            chain_code,
            ask: to_scalar(&hash::prf_expand(&*i_l, &[&[DOMAIN_CHILD_ASK][..]])) + self.ask,
            nsk: to_scalar(&hash::prf_expand(&*i_l, &[&[DOMAIN_CHILD_NSK][..]])) + self.nsk,
            ovk: truncate_32(&hash::prf_expand(&*i_l, &[&[DOMAIN_CHILD_OVK][..], &self.ovk[..]])),
            dk: DiversifierKey(truncate_32(&hash::prf_expand(&*i_l, &[&[DOMAIN_CHILD_DK][..], &self.dk.0[..]])))
        })
    }

    /// ask || nsk || ovk || dk
    fn expanded_parts(&self) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(Vec::with_capacity(128));
        out.extend_from_slice(&self.ask.to_bytes());
        out.extend_from_slice(&self.nsk.to_bytes());
        out.extend_from_slice(&self.ovk);
        out.extend_from_slice(&self.dk.0);
        out
    }

    pub fn to_full_viewing_key(&self) -> Result<FullViewingKey> {
        if bool::from(self.ask.is_zero()) {
            return Err(WalletError::InvalidKeyMaterial("spend authorizing key is zero".to_string()))
        }

        Ok(FullViewingKey {
            ak: generator(&SPENDING_KEY_GENERATOR)? * self.ask,
            nk: generator(&PROOF_GENERATION_KEY_GENERATOR)? * self.nsk,
            ovk: self.ovk
        })
    }

    pub fn to_extended_full_viewing_key(&self) -> Result<ExtendedFullViewingKey> {
        Ok(ExtendedFullViewingKey {
            header: self.header,
            chain_code: self.chain_code,
            fvk: self.to_full_viewing_key()?,
            dk: self.dk.clone()
        })
    }

    pub fn diversifier_key(&self) -> &DiversifierKey {
        &self.dk
    }

    pub fn depth(&self) -> u8 {
        self.header.depth
    }

    pub fn child_index(&self) -> u32 {
        self.header.child_index
    }

    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(Vec::with_capacity(EXTENDED_KEY_LENGTH));
        self.header.write(&mut out);
        out.extend_from_slice(&self.chain_code);
        out.extend_from_slice(&self.expanded_parts());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != EXTENDED_KEY_LENGTH {
            return Err(WalletError::InvalidKeyMaterial(format!(
                "expected a {} byte extended spending key, found {}", EXTENDED_KEY_LENGTH, bytes.len()
            )))
        }

        Ok(Self {
            header: KeyHeader::read(&bytes[..9])?,
            chain_code: try_into(&bytes[9..41])?,
            ask: scalar_from_bytes(&bytes[41..73])?,
            nsk: scalar_from_bytes(&bytes[73..105])?,
            ovk: try_into(&bytes[105..137])?,
            dk: DiversifierKey(try_into(&bytes[137..169])?)
        })
    }

    pub fn encode(&self, params: &CoinParams) -> Result<String> {
        bech32::encode(&params.zsecret_hrp, &self.to_bytes())
    }

    pub fn decode(encoded: &str, params: &CoinParams) -> Result<Self> {
        let bytes = Zeroizing::new(bech32::decode_with_hrp(encoded, &params.zsecret_hrp)?);
        Self::from_bytes(&bytes)
    }
}

impl Drop for ExtendedSpendingKey {
    fn drop(&mut self) {
        self.ask = Fr::ZERO;
        self.nsk = Fr::ZERO;
        self.ovk.zeroize();
        self.chain_code.zeroize();
    }
}

impl PartialEq for ExtendedSpendingKey {
    fn eq(&self, other: &Self) -> bool {
        *self.to_bytes() == *other.to_bytes()
    }
}

impl fmt::Debug for ExtendedSpendingKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ExtendedSpendingKey")
         .field("depth", &self.header.depth)
         .field("child_index", &self.header.child_index)
         .finish_non_exhaustive()
    }
}

/**
    A ZIP-32 extended full viewing key. Can derive every address of the
    spending key it came from but cannot spend.
*/
#[derive(Clone, PartialEq)]
pub struct ExtendedFullViewingKey {
    header: KeyHeader,
    chain_code: [u8; 32],
    fvk: FullViewingKey,
    dk: DiversifierKey
}

impl ExtendedFullViewingKey {
    pub fn fvk(&self) -> &FullViewingKey {
        &self.fvk
    }

    pub fn diversifier_key(&self) -> &DiversifierKey {
        &self.dk
    }

    /**
        The address at diversifier index j, or None if j gives no valid diversifier.
    */
    pub fn address(&self, index: u64) -> Result<Option<PaymentAddress>> {
        let d = self.dk.diversifier(index)?;
        if !d.is_valid() {
            return Ok(None)
        }

        Ok(Some(PaymentAddress::from_ivk(&self.fvk.ivk()?, d)?))
    }

    /**
        The first valid address at or after diversifier index start.
    */
    pub fn find_address(&self, start: u64) -> Result<(u64, PaymentAddress)> {
        let (index, d) = self.dk.find_diversifier(start)?;
        Ok((index, PaymentAddress::from_ivk(&self.fvk.ivk()?, d)?))
    }

    /**
        The address with the lowest valid diversifier index.
    */
    pub fn default_address(&self) -> Result<(u64, PaymentAddress)> {
        self.find_address(0)
    }

    /**
        The diversifier index of an address, if the address belongs to this key.
    */
    pub fn address_index(&self, address: &PaymentAddress) -> Result<Option<u64>> {
        let index = match self.dk.diversifier_index(address.diversifier())? {
            Some(x) => x,
            None => return Ok(None)
        };

        match self.address(index)? {
            Some(derived) if derived == *address => Ok(Some(index)),
            _ => Ok(None)
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(EXTENDED_KEY_LENGTH);
        self.header.write(&mut out);
        out.extend_from_slice(&self.chain_code);
        out.extend_from_slice(&self.fvk.to_bytes());
        out.extend_from_slice(&self.dk.0);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != EXTENDED_KEY_LENGTH {
            return Err(WalletError::InvalidKeyMaterial(format!(
                "expected a {} byte extended viewing key, found {}", EXTENDED_KEY_LENGTH, bytes.len()
            )))
        }

        Ok(Self {
            header: KeyHeader::read(&bytes[..9])?,
            chain_code: try_into(&bytes[9..41])?,
            fvk: FullViewingKey {
                ak: point_from_bytes(&bytes[41..73])?,
                nk: point_from_bytes(&bytes[73..105])?,
                ovk: try_into(&bytes[105..137])?
            },
            dk: DiversifierKey(try_into(&bytes[137..169])?)
        })
    }

    pub fn encode(&self, params: &CoinParams) -> Result<String> {
        bech32::encode(&params.zviewkey_hrp, &self.to_bytes())
    }

    pub fn decode(encoded: &str, params: &CoinParams) -> Result<Self> {
        Self::from_bytes(&bech32::decode_with_hrp(encoded, &params.zviewkey_hrp)?)
    }
}

impl fmt::Debug for ExtendedFullViewingKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ExtendedFullViewingKey({})", hex::encode(&self.fvk.fingerprint()[..4]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_seed() -> Seed {
        Seed::from_bytes(&(0u8..32).collect::<Vec<u8>>()).unwrap()
    }

    struct Zip32Vector {
        path: &'static str,
        xsk: &'static str,
        xfvk: &'static str,
        fp: &'static str,
        ivk: &'static str,
        //Diversifiers at indexes 0, 1 and 2, None where the index is invalid
        d: [Option<&'static str>; 3]
    }

    //Published ZIP-32 Sapling vectors for the seed 0x00..0x1f
    const ZIP32_VECTORS: [Zip32Vector; 4] = [
        Zip32Vector {
            path: "m",
            xsk: "000000000000000000d0947c4b03bf72a37ab44f72276d1cf3fdcd7ebf3e73348b7e550d752018668eb6c00c93d36032b9a268e99e86a860776560bf0e83c1a10b51f607c9547425068204ede83b2f1fbd84f9b45d7f996e2ebd0a030ad243b48ed39f748a8821ea06395884890323b9d4933c021db89bcf767df21977b2ff0683848321a4df4afb2177c17cb75b7796afb39f0f3e91c924607da56fa9a20e283509bc8a3ef996a172",
            xfvk: "000000000000000000d0947c4b03bf72a37ab44f72276d1cf3fdcd7ebf3e73348b7e550d752018668e93442e5feffbff16e7217202dc7306729ffffe85af5683bce2642e3eeb5d3871dce8e7edece04b8950417f85ba57691b783c45b1a27422db1693dceb67b10106395884890323b9d4933c021db89bcf767df21977b2ff0683848321a4df4afb2177c17cb75b7796afb39f0f3e91c924607da56fa9a20e283509bc8a3ef996a172",
            fp: "14c2713adce93a830ea83a051908b7447783f5d106c0985e02550e426f27597c",
            ivk: "4847a130e799d3dbea36a1c16467d621fb2d80e30b3b1d1a426893415dad6601",
            d: [Some("d8621b981cf300e9d4cc89"), Some("48ea17a199c84bd1baa5d4"), None]
        },
        Zip32Vector {
            path: "m/1'",
            xsk: "0114c2713a010000806fccaa45a8206b063ebb68c610e05927aa94d61be93ec25eb4f82efd68caaedbd5f7e92efb7abe04dc8c148b0b3b0fc23e0429f00208ff93b68d21a6e131bd04372a7c6822cbe603f3465c4b9b6558f3a3512decd434012e67bffcf657e5750a2530761933348c1fcf14355433a8d291167fbb37b2ce37ca97160a47ec331c69f288400fd65f9adfe3a7c3720aceee0dae050d0a819d619f92e9e2cb4434d526",
            xfvk: "0114c2713a010000806fccaa45a8206b063ebb68c610e05927aa94d61be93ec25eb4f82efd68caaedbcfca79d337bc689813e409a54e3e72ad8e2f703ae6f8223c9becbde9a8a35f53513de64085d35a3adf23d89d5a21cdee4db4c625bd6a3c3c624bef4344141deb2530761933348c1fcf14355433a8d291167fbb37b2ce37ca97160a47ec331c69f288400fd65f9adfe3a7c3720aceee0dae050d0a819d619f92e9e2cb4434d526",
            fp: "768423cb88d22dee91b5b7661e72ed009557eba144c78d1aa71a3e88b6910696",
            ivk: "f6e75cd980c30eabc61f49ac68f488573ab3e6afe15376375d34e406702ffd02",
            d: [None, Some("bcc323e8da39b496c05051"), None]
        },
        Zip32Vector {
            path: "m/1'/2'",
            xsk: "02768423cb020000804479086c75d080796020f500c1e30a54cfe29dda36f2144fb33a50806fbef7da7ff35db69e13c36f59ad9c08d32d5227378da0cff971fd424baef9a6332f5106779c6ee4a03944eba28bc9bdc1329a391407f48c410d5ae0a364f59959bfde00d9fc7101bf907f41886a7330a5d6a7bd23535e305eb7679bc23d7605936185ace4699e9a86e031c54b21cdd0960ac18ddd61ec9f7ae98d5582a6faf65f3248d1",
            xfvk: "02768423cb020000804479086c75d080796020f500c1e30a54cfe29dda36f2144fb33a50806fbef7da9a853f9544713797e0851764da392e68534b1d948dae4742ee765c727572ab4ef166a28a4f88cec12141a82d2120bd6d8caf879c9a1b3ad2118501364f5d4fbed9fc7101bf907f41886a7330a5d6a7bd23535e305eb7679bc23d7605936185ace4699e9a86e031c54b21cdd0960ac18ddd61ec9f7ae98d5582a6faf65f3248d1",
            fp: "0bdc2d2b6eb1f927cbabdbb9d43db8de857bb716df86cecf081e1a2b74fcad55",
            ivk: "33bd46015a2cad17d6e015eb88861b0c917796246570521c9e1ae4b1c8311d06",
            d: [None, None, None]
        },
        Zip32Vector {
            path: "m/1'/2'/3'",
            xsk: "030bdc2d2b0300008033dc012d7690ced2cd2bcb2cc3e463e28d8c29ef3b01be59b2bdfc385bbdc74b4593d24d21e35937f152cf90461c332f69503c104581d683e0ac29f84decaf071ac87ec2123f5057e3c0f858e80dfa0ee4553ded27b7b5abfbb6fa6effa7bb0b1e36ea0cf2be2e9d6ce380a8af18e75da9225551fbef8b98311b5c9c1b4b9ee357fc6c59a4f3ad5a6f609db671d28cbf703f0d14dc363aaaed70729c107bbb6a",
            xfvk: "030bdc2d2b0300008033dc012d7690ced2cd2bcb2cc3e463e28d8c29ef3b01be59b2bdfc385bbdc74b9c6d859a752c305d6263de95f2fcf734b126df2456c7d31bc601c8ddec409112d3ee41f84b5a9508b61d29b2fb45636d19aa10d782cd978cfe6715492fcd224e1e36ea0cf2be2e9d6ce380a8af18e75da9225551fbef8b98311b5c9c1b4b9ee357fc6c59a4f3ad5a6f609db671d28cbf703f0d14dc363aaaed70729c107bbb6a",
            fp: "df0a89bd883539c07b89e04c92764ec2d159690f5ad5dd3d0ad8ac2969de22c8",
            ivk: "d138e137c6671de782fb01ba911d9864bebc4436ccb388b4c1ce0256a8db7401",
            d: [None, None, None]
        }
    ];

    #[test]
    fn generators_decode() {
        assert!(generator(&SPENDING_KEY_GENERATOR).is_ok());
        assert!(generator(&PROOF_GENERATION_KEY_GENERATOR).is_ok());
    }

    #[test]
    fn master_key_is_deterministic() {
        let a = ExtendedSpendingKey::master(&test_seed());
        let b = ExtendedSpendingKey::master(&test_seed());
        assert_eq!(a, b);
        assert_eq!(a.depth(), 0);
        assert_eq!(a.to_bytes().len(), EXTENDED_KEY_LENGTH);

        let other = ExtendedSpendingKey::master(&Seed::from_bytes(&[9u8; 32]).unwrap());
        assert_ne!(a, other);
    }

    #[test]
    fn account_derivation() {
        let path = Path::sapling_account(133, 0).unwrap();
        let key = ExtendedSpendingKey::from_path(&test_seed(), &path).unwrap();
        assert_eq!(key.depth(), 3);
        assert_eq!(key.child_index(), HARDENED_OFFSET);

        let account_1 = ExtendedSpendingKey::from_path(&test_seed(), &Path::sapling_account(133, 1).unwrap()).unwrap();
        assert_ne!(key, account_1);

        //Parent tag links the child to its parent viewing key
        let parent = ExtendedSpendingKey::from_path(
            &test_seed(),
            &Path { children: path.children[..2].to_vec() }
        ).unwrap();
        let fp = parent.to_full_viewing_key().unwrap().fingerprint();
        assert_eq!(key.header.parent_fvk_tag, fp[..4]);
    }

    #[test]
    fn normal_derivation_rejected() {
        let master = ExtendedSpendingKey::master(&test_seed());
        assert!(matches!(master.derive_child(ChildOptions::Normal(0)), Err(WalletError::BadPath(_))));
    }

    #[test]
    fn spending_key_bytes_round_trip() {
        let key = ExtendedSpendingKey::from_path(&test_seed(), &Path::sapling_account(1, 3).unwrap()).unwrap();
        let parsed = ExtendedSpendingKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(key, parsed);

        let params = CoinParams::testnet();
        let text = key.encode(&params).unwrap();
        assert!(text.starts_with("secret-extended-key-test1"));
        assert_eq!(ExtendedSpendingKey::decode(&text, &params).unwrap(), key);
    }

    #[test]
    fn non_canonical_scalar_rejected() {
        let key = ExtendedSpendingKey::master(&test_seed());
        let mut bytes = key.to_bytes().to_vec();
        for b in &mut bytes[41..73] {
            *b = 0xFF;
        }
        assert!(matches!(ExtendedSpendingKey::from_bytes(&bytes), Err(WalletError::InvalidKeyMaterial(_))));
    }

    #[test]
    fn viewing_key_round_trip() {
        let params = CoinParams::mainnet();
        let key = ExtendedSpendingKey::from_path(&test_seed(), &Path::sapling_account(133, 0).unwrap()).unwrap();
        let xfvk = key.to_extended_full_viewing_key().unwrap();

        let text = xfvk.encode(&params).unwrap();
        assert!(text.starts_with("zxviews1"));
        assert_eq!(ExtendedFullViewingKey::decode(&text, &params).unwrap(), xfvk);
    }

    #[test]
    fn default_address_and_index_recovery() {
        let key = ExtendedSpendingKey::from_path(&test_seed(), &Path::sapling_account(133, 0).unwrap()).unwrap();
        let xfvk = key.to_extended_full_viewing_key().unwrap();

        let (index, address) = xfvk.default_address().unwrap();
        assert!(address.diversifier().is_valid());
        assert_eq!(xfvk.address(index).unwrap(), Some(address));
        assert_eq!(xfvk.address_index(&address).unwrap(), Some(index));

        //An address from another key is not recognised
        let other = ExtendedSpendingKey::master(&test_seed()).to_extended_full_viewing_key().unwrap();
        let (_, foreign) = other.default_address().unwrap();
        assert_eq!(xfvk.address_index(&foreign).unwrap(), None);
    }

    #[test]
    fn diversified_addresses_share_ivk() {
        let xfvk = ExtendedSpendingKey::master(&test_seed()).to_extended_full_viewing_key().unwrap();
        let (i, a) = xfvk.find_address(0).unwrap();
        let (j, b) = xfvk.find_address(i + 1).unwrap();
        assert!(j > i);
        assert_ne!(a, b);

        let ivk = xfvk.fvk().ivk().unwrap();
        assert_eq!(*b.pk_d(), b.diversifier().g_d().unwrap() * ivk);
    }

    #[test]
    fn zip32_test_vectors() {
        for tv in &ZIP32_VECTORS {
            let path: Path = tv.path.parse().unwrap();
            let xsk = ExtendedSpendingKey::from_path(&test_seed(), &path).unwrap();
            assert_eq!(hex::encode(&*xsk.to_bytes()), tv.xsk, "{}", tv.path);

            let xfvk = xsk.to_extended_full_viewing_key().unwrap();
            assert_eq!(hex::encode(xfvk.to_bytes()), tv.xfvk, "{}", tv.path);
            assert_eq!(hex::encode(xfvk.fvk().fingerprint()), tv.fp, "{}", tv.path);
            assert_eq!(hex::encode(xfvk.fvk().ivk().unwrap().to_bytes()), tv.ivk, "{}", tv.path);

            let dk = xfvk.diversifier_key();
            for (index, expected) in tv.d.iter().enumerate() {
                let d = dk.diversifier(index as u64).unwrap();
                match expected {
                    Some(x) => {
                        assert_eq!(hex::encode(d.0), *x, "{} d{}", tv.path, index);
                        assert!(d.is_valid());
                    },
                    None => assert!(!d.is_valid(), "{} d{}", tv.path, index)
                }
            }

            //The default address sits at the first valid index
            let (index, address) = xfvk.default_address().unwrap();
            match tv.d.iter().position(|d| d.is_some()) {
                Some(first) => {
                    assert_eq!(index, first as u64);
                    assert_eq!(hex::encode(address.diversifier().0), tv.d[first].unwrap());
                },
                None => assert!(index > 2)
            }
            let ivk = xfvk.fvk().ivk().unwrap();
            assert_eq!(*address.pk_d(), address.diversifier().g_d().unwrap() * ivk);

            //Both encodings parse back to the published bytes
            assert_eq!(ExtendedSpendingKey::from_bytes(&hex::decode(tv.xsk).unwrap()).unwrap(), xsk);
            assert_eq!(ExtendedFullViewingKey::from_bytes(&hex::decode(tv.xfvk).unwrap()).unwrap(), xfvk);
        }
    }
}

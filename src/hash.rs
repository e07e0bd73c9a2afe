/*
    Hash module include hash function necessary to hash
    a public key into an address, checksum Base58Check payloads
    and run the BLAKE2 based PRFs used by Sapling key derivation.
*/

use crate::{
    Ripemd160, Sha256, Digest
};

/// Personalisation for PRF^expand
pub const PRF_EXPAND_PERSONALIZATION: &[u8; 16] = b"Zcash_ExpandSeed";

/*
    Takes in an byte array and returns the ripemd160 hash of it
*/
pub fn ripemd160<T>(input: T) -> [u8; 20]
where T: AsRef<[u8]>
{
    let mut r = Ripemd160::new();
    r.update(input);
    r.finalize().into()
}

/*
    Takes in a byte array and returns the sha256 hash of it
*/
pub fn sha256<T>(input: T) -> [u8; 32]
where T: AsRef<[u8]>
{
    let mut r = Sha256::new();
    r.update(input);
    r.finalize().into()
}

/*
    Double sha256, used for Base58Check checksums and address hashes
*/
pub fn sha256d<T>(input: T) -> [u8; 32]
where T: AsRef<[u8]>
{
    sha256(sha256(input))
}

/*
    Ripemd160( Sha256( input ) )
*/
pub fn hash160<T>(input: T) -> [u8; 20]
where T: AsRef<[u8]>
{
    ripemd160(sha256(input))
}

/**
    BLAKE2b with the given personalisation over the concatenation of parts.
    The output length is the const parameter N (at most 64).
*/
pub fn blake2b_personal<const N: usize>(personal: &[u8], parts: &[&[u8]]) -> [u8; N] {
    let mut state = blake2b_simd::Params::new()
        .hash_length(N)
        .personal(personal)
        .to_state();
    for part in parts {
        state.update(part);
    }

    let mut out = [0u8; N];
    out.copy_from_slice(state.finalize().as_bytes());
    out
}

/**
    BLAKE2s-256 with the given 8 byte personalisation over the concatenation of parts.
*/
pub fn blake2s_personal(personal: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut state = blake2s_simd::Params::new()
        .hash_length(32)
        .personal(personal)
        .to_state();
    for part in parts {
        state.update(part);
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(state.finalize().as_bytes());
    out
}

/**
    PRF^expand(key, t) = BLAKE2b-512("Zcash_ExpandSeed", key || t)
    where t is given as a list of parts that are concatenated.
*/
pub fn prf_expand(key: &[u8], t: &[&[u8]]) -> [u8; 64] {
    let mut parts: Vec<&[u8]> = Vec::with_capacity(t.len() + 1);
    parts.push(key);
    parts.extend_from_slice(t);
    blake2b_personal::<64>(PRF_EXPAND_PERSONALIZATION, &parts)
}

/*
    Module that bundles together the text encodings used by the coin:
    Base58Check for transparent addresses and keys, Bech32 for Sapling
*/

pub mod base58;
pub mod bech32;

/*
    Library to create offline paper wallets for Zcash
    and coins that share its address formats.

    Generates transparent (secp256k1) key pairs and Sapling shielded keys
    derived with ZIP-32, encodes them in the coin's text formats, optionally
    encrypts the private keys under a passphrase and assembles everything
    into a printable wallet record with scannable code payloads.

    Nothing here touches the network or the disk.

    References:
        - Zcash protocol specification (https://zips.z.cash/protocol/protocol.pdf)
            for the Sapling key components and encodings

        - ZIP-32 (https://zips.z.cash/zip-0032)
            for shielded hierarchical derivation

        - BIP38 (https://github.com/bitcoin/bips/blob/master/bip-0038.mediawiki)
            for passphrase encrypted transparent keys
*/

//Outward facing modules
pub mod key;
pub mod address;
pub mod shielded;
pub mod encoding;
pub mod encrypt;
pub mod record;
pub mod generator;
pub mod vanity;
pub mod params;
pub mod wallet_key;
pub mod entropy;
pub mod error;
pub mod util;
pub mod prelude;

//Modules for internal use
mod hash;
mod impls;

//Dependencies
use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use sha2::{Sha256, Digest};
use ripemd::Ripemd160;
use bs58;

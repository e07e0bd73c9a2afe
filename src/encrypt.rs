/*
    Passphrase protection of private keys.

    Transparent keys use the BIP38 non-EC-multiply construction unchanged:
        addresshash = SHA256d(address)[0..4]
        derived = scrypt(passphrase, addresshash, N, r, p, 64)
        ciphertext = AES-256-ECB(derived[32..64], key XOR derived[0..32])
        Base58Check(0x01 0x42 || 0xE0 || addresshash || ciphertext)

    Shielded keys reuse the same construction over the 169 byte extended
    spending key followed by the 7 byte diversifier index of the address
    (176 bytes, eleven AES blocks) and are Bech32 encoded under
    "<extsk prefix>-encrypted" as 0x01 || addresshash || ciphertext.

    Decryption recomputes the address of the recovered key and compares its
    hash with the stored one, so a wrong passphrase is always detected.

    References:
        - BIP38, Passphrase-protected private key
          (https://github.com/bitcoin/bips/blob/master/bip-0038.mediawiki)
*/

use aes::{
    Aes256,
    cipher::{BlockDecrypt, BlockEncrypt, KeyInit, generic_array::GenericArray}
};
use serde::{Deserialize, Serialize};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering}
};
use zeroize::Zeroizing;

use crate::{
    encoding::{base58::Base58, bech32},
    error::{Result, WalletError},
    hash,
    key::{PrivKey, TransparentKeyPair},
    params::CoinParams,
    shielded::{keys::{ExtendedSpendingKey, EXTENDED_KEY_LENGTH}, ShieldedKeys},
    util::try_into,
    wallet_key::WalletKey
};

/// Base58Check prefix of a BIP38 key without EC multiplication
pub const BIP38_PREFIX: [u8; 2] = [0x01, 0x42];
/// BIP38 flag byte: no EC multiply, compressed public key
pub const BIP38_FLAG_COMPRESSED: u8 = 0xE0;
/// Leading byte of an encrypted shielded key
pub const SHIELDED_FORMAT_VERSION: u8 = 0x01;

/// Bytes of the diversifier index stored after the extended spending key
const INDEX_LENGTH: usize = 7;
const SHIELDED_PAYLOAD_LENGTH: usize = EXTENDED_KEY_LENGTH + INDEX_LENGTH;
const TRANSPARENT_PAYLOAD_LENGTH: usize = 32;
const AES_KEY_LENGTH: usize = 32;
const AES_BLOCK_LENGTH: usize = 16;

/**
    scrypt cost parameters. The default is the BIP38 cost
    (N = 2^14, r = 8, p = 8).
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub log_n: u8,
    pub r: u32,
    pub p: u32
}

impl KdfParams {
    pub fn new(log_n: u8, r: u32, p: u32) -> Result<Self> {
        let params = Self { log_n, r, p };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_n == 0 {
            return Err(WalletError::InvalidParams("scrypt log_n must be at least 1".to_string()))
        }
        self.to_scrypt().map(|_| ())
    }

    fn to_scrypt(&self) -> Result<scrypt::Params> {
        //The length argument only bounds the PHC output, the raw output length is free
        scrypt::Params::new(self.log_n, self.r, self.p, scrypt::Params::RECOMMENDED_LEN)
            .map_err(|e| WalletError::InvalidParams(format!("scrypt cost {:?}: {}", self, e)))
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self { log_n: 14, r: 8, p: 8 }
    }
}

/**
    Shared flag that aborts an encryption or decryption in progress.
*/
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/**
    A passphrase encrypted private key.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptedPrivateKey {
    Transparent {
        address_hash: [u8; 4],
        ciphertext: [u8; TRANSPARENT_PAYLOAD_LENGTH]
    },
    Shielded {
        address_hash: [u8; 4],
        ciphertext: Vec<u8>
    }
}

impl EncryptedPrivateKey {
    pub fn address_hash(&self) -> &[u8; 4] {
        match self {
            Self::Transparent { address_hash, .. } => address_hash,
            Self::Shielded { address_hash, .. } => address_hash
        }
    }

    pub fn encode(&self, params: &CoinParams) -> Result<String> {
        match self {
            Self::Transparent { address_hash, ciphertext } => {
                let mut payload = vec![BIP38_FLAG_COMPRESSED];
                payload.extend_from_slice(address_hash);
                payload.extend_from_slice(ciphertext);
                Ok(Base58::new(&BIP38_PREFIX, &payload).check_encode())
            },
            Self::Shielded { address_hash, ciphertext } => {
                let mut payload = vec![SHIELDED_FORMAT_VERSION];
                payload.extend_from_slice(address_hash);
                payload.extend_from_slice(ciphertext);
                bech32::encode(&params.encrypted_zsecret_hrp(), &payload)
            }
        }
    }

    /**
        Parses either encrypted form. Bech32 strings under an encrypted key
        prefix are shielded keys, anything else is tried as BIP38.
    */
    pub fn decode(encoded: &str, params: &CoinParams) -> Result<Self> {
        //Any "-encrypted" Bech32 string is shielded, a foreign prefix is a network mismatch
        if encoded.to_lowercase().contains("-encrypted1") {
            let payload = bech32::decode_with_hrp(encoded, &params.encrypted_zsecret_hrp())?;
            if payload.len() != 5 + SHIELDED_PAYLOAD_LENGTH || payload[0] != SHIELDED_FORMAT_VERSION {
                return Err(WalletError::Encoding("not an encrypted shielded key".to_string()))
            }

            return Ok(Self::Shielded {
                address_hash: try_into(&payload[1..5])?,
                ciphertext: payload[5..].to_vec()
            })
        }

        let payload = Base58::check_decode(encoded)?;
        if payload.len() != 2 + 1 + 4 + TRANSPARENT_PAYLOAD_LENGTH || payload[..2] != BIP38_PREFIX {
            return Err(WalletError::Encoding("not a BIP38 encrypted key".to_string()))
        }
        if payload[2] != BIP38_FLAG_COMPRESSED {
            return Err(WalletError::InvalidKeyMaterial(format!(
                "unsupported BIP38 flag byte {:#04x}", payload[2]
            )))
        }

        Ok(Self::Transparent {
            address_hash: try_into(&payload[3..7])?,
            ciphertext: try_into(&payload[7..])?
        })
    }
}

/// SHA256d(address text)[0..4]
pub fn address_hash(address: &str) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash::sha256d(address.as_bytes())[..4]);
    out
}

/**
    Encrypts and decrypts private keys for one coin at a fixed scrypt cost.
*/
#[derive(Debug, Clone)]
pub struct PassphraseEncryptor {
    params: CoinParams,
    kdf: KdfParams
}

impl PassphraseEncryptor {
    pub fn new(params: CoinParams, kdf: KdfParams) -> Result<Self> {
        kdf.validate()?;
        Ok(Self { params, kdf })
    }

    pub fn params(&self) -> &CoinParams {
        &self.params
    }

    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }

    /**
        Encrypts a key. The address must be the key's own address text.
    */
    pub fn encrypt(&self, key: &WalletKey, passphrase: &str, address: &str) -> Result<EncryptedPrivateKey> {
        self.encrypt_with_cancel(key, passphrase, address, &CancelToken::new())
    }

    pub fn encrypt_with_cancel(
        &self,
        key: &WalletKey,
        passphrase: &str,
        address: &str,
        cancel: &CancelToken
    ) -> Result<EncryptedPrivateKey> {
        if key.address_text(&self.params)? != address {
            return Err(WalletError::InvalidKeyMaterial("address does not belong to the key".to_string()))
        }
        let address_hash = address_hash(address);

        match key {
            WalletKey::Transparent(pair) => {
                let payload = pair.private_key().to_bytes();
                let ciphertext = self.seal(&payload[..], passphrase, &address_hash, cancel)?;

                Ok(EncryptedPrivateKey::Transparent { address_hash, ciphertext: try_into(&ciphertext)? })
            },
            WalletKey::Shielded(keys) => {
                let index = keys.diversifier_index();
                if index >> (8 * INDEX_LENGTH) != 0 {
                    return Err(WalletError::InvalidKeyMaterial(format!(
                        "diversifier index {} does not fit in {} bytes", index, INDEX_LENGTH
                    )))
                }

                let mut payload = keys.spending_key().to_bytes();
                payload.extend_from_slice(&index.to_le_bytes()[..INDEX_LENGTH]);
                let ciphertext = self.seal(&payload, passphrase, &address_hash, cancel)?;

                Ok(EncryptedPrivateKey::Shielded { address_hash, ciphertext: ciphertext.to_vec() })
            }
        }
    }

    /**
        Recovers the key. Fails with WrongPassphrase if the recovered key does
        not reproduce the stored address hash.

        Transparent ciphertexts carry no network marker. The address hash is
        taken over the address of this encryptor's network, so a key
        encrypted for another network also fails with WrongPassphrase even
        when the passphrase is right.
    */
    pub fn decrypt(&self, encrypted: &EncryptedPrivateKey, passphrase: &str) -> Result<WalletKey> {
        self.decrypt_with_cancel(encrypted, passphrase, &CancelToken::new())
    }

    pub fn decrypt_with_cancel(
        &self,
        encrypted: &EncryptedPrivateKey,
        passphrase: &str,
        cancel: &CancelToken
    ) -> Result<WalletKey> {
        let key = match encrypted {
            EncryptedPrivateKey::Transparent { address_hash, ciphertext } => {
                let payload = self.open(ciphertext, passphrase, address_hash, cancel)?;
                let private_key = match PrivKey::from_slice(&payload) {
                    Ok(x) => x,
                    Err(_) => return Err(WalletError::WrongPassphrase)
                };

                WalletKey::Transparent(TransparentKeyPair::from_private_key(private_key))
            },
            EncryptedPrivateKey::Shielded { address_hash, ciphertext } => {
                if ciphertext.len() != SHIELDED_PAYLOAD_LENGTH {
                    return Err(WalletError::Encoding("encrypted shielded key has the wrong length".to_string()))
                }
                let payload = self.open(ciphertext, passphrase, address_hash, cancel)?;

                let spending_key = match ExtendedSpendingKey::from_bytes(&payload[..EXTENDED_KEY_LENGTH]) {
                    Ok(x) => x,
                    Err(_) => return Err(WalletError::WrongPassphrase)
                };
                let mut index_bytes = [0u8; 8];
                index_bytes[..INDEX_LENGTH].copy_from_slice(&payload[EXTENDED_KEY_LENGTH..]);
                let index = u64::from_le_bytes(index_bytes);

                let xfvk = match spending_key.to_extended_full_viewing_key() {
                    Ok(x) => x,
                    Err(_) => return Err(WalletError::WrongPassphrase)
                };
                if xfvk.address(index)?.is_none() {
                    return Err(WalletError::WrongPassphrase)
                }

                WalletKey::Shielded(ShieldedKeys::from_spending_key(spending_key)?.at_index(index)?)
            }
        };

        if address_hash(&key.address_text(&self.params)?) != *encrypted.address_hash() {
            return Err(WalletError::WrongPassphrase)
        }

        Ok(key)
    }

    /**
        Decodes and decrypts an encrypted key string.
    */
    pub fn decrypt_text(&self, encoded: &str, passphrase: &str) -> Result<WalletKey> {
        let encrypted = EncryptedPrivateKey::decode(encoded, &self.params)?;
        self.decrypt(&encrypted, passphrase)
    }

    /**
        scrypt(passphrase, addresshash) giving payload_len bytes of mask and
        a 32 byte AES key. Checks the cancel token on both sides of the KDF.
    */
    fn derive(&self, passphrase: &str, salt: &[u8; 4], payload_len: usize, cancel: &CancelToken) -> Result<Zeroizing<Vec<u8>>> {
        if cancel.is_cancelled() {
            return Err(WalletError::Cancelled)
        }

        let mut derived = Zeroizing::new(vec![0u8; payload_len + AES_KEY_LENGTH]);
        if let Err(e) = scrypt::scrypt(passphrase.as_bytes(), salt, &self.kdf.to_scrypt()?, &mut derived) {
            return Err(WalletError::InvalidParams(format!("scrypt output: {}", e)))
        }

        if cancel.is_cancelled() {
            tracing::debug!("key derivation cancelled, discarding derived key");
            return Err(WalletError::Cancelled)
        }

        Ok(derived)
    }

    fn seal(&self, payload: &[u8], passphrase: &str, salt: &[u8; 4], cancel: &CancelToken) -> Result<Zeroizing<Vec<u8>>> {
        let derived = self.derive(passphrase, salt, payload.len(), cancel)?;
        let (mask, key) = derived.split_at(payload.len());

        let mut block = Zeroizing::new(payload.to_vec());
        for (b, m) in block.iter_mut().zip(mask) {
            *b ^= m;
        }

        let cipher = Aes256::new(GenericArray::from_slice(key));
        for chunk in block.chunks_exact_mut(AES_BLOCK_LENGTH) {
            cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
        }

        Ok(block)
    }

    fn open(&self, ciphertext: &[u8], passphrase: &str, salt: &[u8; 4], cancel: &CancelToken) -> Result<Zeroizing<Vec<u8>>> {
        let derived = self.derive(passphrase, salt, ciphertext.len(), cancel)?;
        let (mask, key) = derived.split_at(ciphertext.len());

        let mut block = Zeroizing::new(ciphertext.to_vec());
        let cipher = Aes256::new(GenericArray::from_slice(key));
        for chunk in block.chunks_exact_mut(AES_BLOCK_LENGTH) {
            cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
        }

        for (b, m) in block.iter_mut().zip(mask) {
            *b ^= m;
        }

        Ok(block)
    }
}

/*
    The printable wallet record.

    A record is assembled once by RecordBuilder, which checks that every entry
    decodes back to itself before anything is handed to the presentation
    layer. After build() the record is read-only.
*/

use chrono::{DateTime, Utc};
use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{
    address::TransparentAddress,
    encrypt::{address_hash, EncryptedPrivateKey, PassphraseEncryptor},
    error::{Result, WalletError},
    key::{PrivKey, TransparentKeyPair},
    params::CoinParams,
    shielded::{
        address::PaymentAddress,
        keys::{ExtendedFullViewingKey, ExtendedSpendingKey},
        path::Path
    },
    wallet_key::{AddressType, WalletKey}
};

/// Private key text of an entry, in the clear or passphrase encrypted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum KeyText {
    Plain(String),
    Encrypted(String)
}

impl KeyText {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(x) => x,
            Self::Encrypted(x) => x
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEntry {
    pub address: String,
    pub private_key: KeyText,
    pub address_type: AddressType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewing_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation_path: Option<String>
}

impl WalletEntry {
    /**
        Entry with the private key in the clear.
    */
    pub fn plain(key: &WalletKey, params: &CoinParams) -> Result<Self> {
        Ok(Self {
            address: key.address_text(params)?,
            private_key: KeyText::Plain(key.private_key_text(params)?),
            address_type: key.address_type(),
            viewing_key: key.viewing_key_text(params)?,
            derivation_path: key.derivation_path()
        })
    }

    /**
        Entry with the private key encrypted under a passphrase.
    */
    pub fn encrypted(key: &WalletKey, encryptor: &PassphraseEncryptor, passphrase: &str) -> Result<Self> {
        let params = encryptor.params();
        let address = key.address_text(params)?;
        let encrypted = encryptor.encrypt(key, passphrase, &address)?;

        Ok(Self {
            private_key: KeyText::Encrypted(encrypted.encode(params)?),
            address,
            address_type: key.address_type(),
            viewing_key: key.viewing_key_text(params)?,
            derivation_path: key.derivation_path()
        })
    }
}

/// Scannable payloads of one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCode {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeOptions {
    /// Emit a second code carrying the private key text
    pub include_private_key: bool,
    /// Amount added to payment URIs, e.g. "0.5"
    #[serde(default)]
    pub amount: Option<String>
}

impl Default for CodeOptions {
    fn default() -> Self {
        Self { include_private_key: true, amount: None }
    }
}

/**
    A validated wallet record. Only RecordBuilder::build creates one, and
    from_json sends stored records back through the same checks.
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletRecord {
    created_at: DateTime<Utc>,
    network_id: String,
    entries: Vec<WalletEntry>,
    codes: Vec<ScanCode>
}

impl WalletRecord {
    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    pub fn network_id(&self) -> &str {
        &self.network_id
    }

    pub fn entries(&self) -> &[WalletEntry] {
        &self.entries
    }

    /// One code per entry, in entry order
    pub fn codes(&self) -> &[ScanCode] {
        &self.codes
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /**
        Loads a record written by to_json. The entries are validated again
        under params and the codes are rendered afresh with options.
    */
    pub fn from_json(json: &str, params: &CoinParams, options: CodeOptions) -> Result<Self> {
        let stored: StoredRecord = serde_json::from_str(json)?;
        if stored.network_id != params.network_id() {
            return Err(WalletError::NetworkMismatch { expected: params.network_id(), found: stored.network_id })
        }

        RecordBuilder::new(params.clone())
            .options(options)
            .created_at(stored.created_at)
            .entries(stored.entries)
            .build()
    }
}

#[derive(Deserialize)]
struct StoredRecord {
    created_at: DateTime<Utc>,
    network_id: String,
    entries: Vec<WalletEntry>
}

/**
    Collects entries and produces a validated WalletRecord.
*/
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    params: CoinParams,
    options: CodeOptions,
    created_at: Option<DateTime<Utc>>,
    entries: Vec<WalletEntry>
}

impl RecordBuilder {
    pub fn new(params: CoinParams) -> Self {
        Self {
            params,
            options: CodeOptions::default(),
            created_at: None,
            entries: vec![]
        }
    }

    pub fn options(mut self, options: CodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Fixes the creation time instead of reading the clock at build time
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn entry(mut self, entry: WalletEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn entries<I: IntoIterator<Item = WalletEntry>>(mut self, entries: I) -> Self {
        self.entries.extend(entries);
        self
    }

    /**
        Validates every entry and renders its scannable payloads.
        Any entry that does not round trip fails the whole record with MalformedEntry.
    */
    pub fn build(self) -> Result<WalletRecord> {
        if self.entries.is_empty() {
            return Err(WalletError::MalformedEntry("a record needs at least one entry".to_string()))
        }
        if let Some(amount) = &self.options.amount {
            if !is_decimal_amount(amount) {
                return Err(WalletError::MalformedEntry(format!("bad payment amount {:?}", amount)))
            }
        }

        let mut codes = Vec::with_capacity(self.entries.len());
        for (i, entry) in self.entries.iter().enumerate() {
            let code = self.validate(entry)
                .and_then(|_| self.scan_code(entry))
                .map_err(|e| match e {
                    WalletError::MalformedEntry(m) => WalletError::MalformedEntry(format!("entry {}: {}", i, m)),
                    e => WalletError::MalformedEntry(format!("entry {}: {}", i, e))
                })?;
            codes.push(code);
        }

        Ok(WalletRecord {
            created_at: self.created_at.unwrap_or_else(Utc::now),
            network_id: self.params.network_id(),
            entries: self.entries,
            codes
        })
    }

    fn validate(&self, entry: &WalletEntry) -> Result<()> {
        if let Some(path) = &entry.derivation_path {
            Path::from_str(path)?;
        }

        match entry.address_type {
            AddressType::Transparent => self.validate_transparent(entry),
            AddressType::Shielded => self.validate_shielded(entry)
        }
    }

    fn validate_transparent(&self, entry: &WalletEntry) -> Result<()> {
        TransparentAddress::decode(&entry.address, &self.params)?;
        if entry.viewing_key.is_some() {
            return Err(WalletError::MalformedEntry("transparent entries have no viewing key".to_string()))
        }

        match &entry.private_key {
            KeyText::Plain(wif) => {
                let pair = TransparentKeyPair::from_private_key(PrivKey::from_wif(wif, &self.params)?);
                if pair.address().encode(&self.params) != entry.address {
                    return Err(WalletError::MalformedEntry("private key does not match the address".to_string()))
                }
            },
            KeyText::Encrypted(text) => match EncryptedPrivateKey::decode(text, &self.params)? {
                EncryptedPrivateKey::Transparent { address_hash: hash, .. } => check_address_hash(&hash, &entry.address)?,
                _ => return Err(WalletError::MalformedEntry("shielded key on a transparent entry".to_string()))
            }
        }

        Ok(())
    }

    fn validate_shielded(&self, entry: &WalletEntry) -> Result<()> {
        let address = PaymentAddress::decode(&entry.address, &self.params)?;

        let viewing_key = match &entry.viewing_key {
            Some(text) => Some(ExtendedFullViewingKey::decode(text, &self.params)?),
            None => None
        };

        match &entry.private_key {
            KeyText::Plain(text) => {
                let xfvk = ExtendedSpendingKey::decode(text, &self.params)?.to_extended_full_viewing_key()?;
                if xfvk.address_index(&address)?.is_none() {
                    return Err(WalletError::MalformedEntry("spending key does not match the address".to_string()))
                }
                if let Some(v) = &viewing_key {
                    if *v != xfvk {
                        return Err(WalletError::MalformedEntry("viewing key does not match the spending key".to_string()))
                    }
                }
            },
            KeyText::Encrypted(text) => {
                match EncryptedPrivateKey::decode(text, &self.params)? {
                    EncryptedPrivateKey::Shielded { address_hash: hash, .. } => check_address_hash(&hash, &entry.address)?,
                    _ => return Err(WalletError::MalformedEntry("transparent key on a shielded entry".to_string()))
                }
                if let Some(v) = &viewing_key {
                    if v.address_index(&address)?.is_none() {
                        return Err(WalletError::MalformedEntry("viewing key does not match the address".to_string()))
                    }
                }
            }
        }

        Ok(())
    }

    fn scan_code(&self, entry: &WalletEntry) -> Result<ScanCode> {
        let address = match &self.params.uri_scheme {
            Some(scheme) => match &self.options.amount {
                Some(amount) => format!("{}:{}?amount={}", scheme, entry.address, amount),
                None => format!("{}:{}", scheme, entry.address)
            },
            None => entry.address.clone()
        };
        check_fits_code(&address)?;

        let private_key = match self.options.include_private_key {
            true => {
                check_fits_code(entry.private_key.as_str())?;
                Some(entry.private_key.as_str().to_string())
            },
            false => None
        };

        Ok(ScanCode { address, private_key })
    }
}

fn check_address_hash(hash: &[u8; 4], address: &str) -> Result<()> {
    match address_hash(address) == *hash {
        true => Ok(()),
        false => Err(WalletError::MalformedEntry("encrypted key was made for another address".to_string()))
    }
}

fn check_fits_code(payload: &str) -> Result<()> {
    match QrCode::new(payload.as_bytes()) {
        Ok(_) => Ok(()),
        Err(e) => Err(WalletError::MalformedEntry(format!("payload does not fit a QR code: {}", e)))
    }
}

fn is_decimal_amount(amount: &str) -> bool {
    let (whole, frac) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, "")
    };

    !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && frac.len() <= 8
        && frac.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        encrypt::KdfParams,
        entropy::{OsEntropy, Seed},
        shielded::ShieldedKeys
    };
    use chrono::TimeZone;

    fn transparent_key() -> WalletKey {
        TransparentKeyPair::generate(&OsEntropy).unwrap().into()
    }

    fn shielded_key(params: &CoinParams) -> WalletKey {
        let seed = Seed::generate(&OsEntropy, None).unwrap();
        ShieldedKeys::derive(&seed, params, 0).unwrap().into()
    }

    #[test]
    fn build_mixed_record() {
        let params = CoinParams::mainnet();
        let t = WalletEntry::plain(&transparent_key(), &params).unwrap();
        let z = WalletEntry::plain(&shielded_key(&params), &params).unwrap();
        let when = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let record = RecordBuilder::new(params.clone())
            .created_at(when)
            .entry(t.clone())
            .entry(z.clone())
            .build()
            .unwrap();

        assert_eq!(record.network_id(), "zcash-main");
        assert_eq!(record.created_at(), &when);
        assert_eq!(record.entries(), &[t.clone(), z.clone()]);
        assert_eq!(record.codes().len(), 2);
        assert_eq!(record.codes()[0].address, format!("zcash:{}", t.address));
        assert_eq!(record.codes()[1].private_key.as_deref(), Some(z.private_key.as_str()));
        assert_eq!(z.derivation_path.as_deref(), Some("m/32'/133'/0'"));

        let json = record.to_json().unwrap();
        let parsed = WalletRecord::from_json(&json, &params, CodeOptions::default()).unwrap();
        assert_eq!(parsed, record);
        assert!(matches!(
            WalletRecord::from_json(&json, &CoinParams::testnet(), CodeOptions::default()),
            Err(WalletError::NetworkMismatch { .. })
        ));
    }

    #[test]
    fn stored_record_is_validated_again() {
        let params = CoinParams::mainnet();
        let a = WalletEntry::plain(&transparent_key(), &params).unwrap();
        let b = WalletEntry::plain(&transparent_key(), &params).unwrap();
        let record = RecordBuilder::new(params.clone()).entry(a).build().unwrap();

        //Swap in another wallet's key behind the record's back
        let mut value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        value["entries"][0]["private_key"]["text"] = serde_json::Value::String(b.private_key.as_str().to_string());

        assert!(matches!(
            WalletRecord::from_json(&value.to_string(), &params, CodeOptions::default()),
            Err(WalletError::MalformedEntry(_))
        ));
    }

    #[test]
    fn code_options() {
        let mut params = CoinParams::testnet();
        params.uri_scheme = None;
        let t = WalletEntry::plain(&transparent_key(), &params).unwrap();

        let record = RecordBuilder::new(params.clone())
            .options(CodeOptions { include_private_key: false, amount: None })
            .entry(t.clone())
            .build()
            .unwrap();
        assert_eq!(record.codes()[0], ScanCode { address: t.address.clone(), private_key: None });

        let record = RecordBuilder::new(CoinParams::testnet())
            .options(CodeOptions { include_private_key: true, amount: Some("1.25".to_string()) })
            .entry(t.clone())
            .build()
            .unwrap();
        assert_eq!(record.codes()[0].address, format!("zcash:{}?amount=1.25", t.address));

        let bad_amount = RecordBuilder::new(CoinParams::testnet())
            .options(CodeOptions { include_private_key: true, amount: Some("1e5".to_string()) })
            .entry(t)
            .build();
        assert!(matches!(bad_amount, Err(WalletError::MalformedEntry(_))));
    }

    #[test]
    fn encrypted_entries_validate() {
        let params = CoinParams::mainnet();
        let encryptor = PassphraseEncryptor::new(params.clone(), KdfParams::new(8, 8, 1).unwrap()).unwrap();
        let t = WalletEntry::encrypted(&transparent_key(), &encryptor, "pw").unwrap();
        let z = WalletEntry::encrypted(&shielded_key(&params), &encryptor, "pw").unwrap();
        assert!(t.private_key.is_encrypted());
        assert!(t.private_key.as_str().starts_with("6P"));

        let record = RecordBuilder::new(params).entries(vec![t, z]).build().unwrap();
        assert_eq!(record.entries().len(), 2);
    }

    #[test]
    fn mismatched_entries_rejected() {
        let params = CoinParams::mainnet();
        let a = WalletEntry::plain(&transparent_key(), &params).unwrap();
        let b = WalletEntry::plain(&transparent_key(), &params).unwrap();

        let mut swapped = a.clone();
        swapped.private_key = b.private_key.clone();
        let result = RecordBuilder::new(params.clone()).entry(a.clone()).entry(swapped).build();
        assert!(matches!(result, Err(WalletError::MalformedEntry(m)) if m.starts_with("entry 1")));

        let z1 = WalletEntry::plain(&shielded_key(&params), &params).unwrap();
        let z2 = WalletEntry::plain(&shielded_key(&params), &params).unwrap();
        let mut wrong_view = z1.clone();
        wrong_view.viewing_key = z2.viewing_key.clone();
        assert!(RecordBuilder::new(params.clone()).entry(wrong_view).build().is_err());

        let mut wrong_type = a;
        wrong_type.address_type = AddressType::Shielded;
        assert!(RecordBuilder::new(params.clone()).entry(wrong_type).build().is_err());

        //Entries from another network do not round trip
        let test_entry = WalletEntry::plain(&transparent_key(), &CoinParams::testnet()).unwrap();
        assert!(RecordBuilder::new(params.clone()).entry(test_entry).build().is_err());

        assert!(matches!(RecordBuilder::new(params).build(), Err(WalletError::MalformedEntry(_))));
    }
}

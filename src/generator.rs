/*
    Wallet generation.

    Random mode gives every wallet its own seed. Seeded mode draws one seed
    per batch and derives wallet i at shielded account i', with transparent
    keys taken from a stream keyed by the same seed, so the whole batch can
    be regenerated from that seed.
*/

use std::{fmt, ops::Range, thread};
use zeroize::Zeroizing;

use crate::{
    encrypt::{KdfParams, PassphraseEncryptor},
    entropy::{EntropySource, Seed},
    error::{Result, WalletError},
    key::TransparentKeyPair,
    params::CoinParams,
    record::{CodeOptions, RecordBuilder, WalletEntry, WalletRecord},
    shielded::ShieldedKeys,
    wallet_key::{AddressType, WalletKey}
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DerivationMode {
    /// Fresh seed per wallet, shielded account 0
    Random,
    /// One seed per batch, wallet i at account i
    #[default]
    Seeded
}

/**
    What to generate. One record per wallet, one entry per address type.
*/
#[derive(Clone)]
pub struct GenerationRequest {
    pub address_types: Vec<AddressType>,
    pub count: u32,
    pub passphrase: Option<Zeroizing<String>>,
    pub user_entropy: Option<Zeroizing<Vec<u8>>>,
    pub mode: DerivationMode,
    pub kdf: KdfParams,
    pub code_options: CodeOptions
}

impl GenerationRequest {
    pub fn new(address_types: &[AddressType], count: u32) -> Self {
        Self {
            address_types: address_types.to_vec(),
            count,
            passphrase: None,
            user_entropy: None,
            mode: DerivationMode::default(),
            kdf: KdfParams::default(),
            code_options: CodeOptions::default()
        }
    }

    pub fn with_passphrase(mut self, passphrase: &str) -> Self {
        self.passphrase = Some(Zeroizing::new(passphrase.to_string()));
        self
    }

    pub fn with_user_entropy(mut self, entropy: &[u8]) -> Self {
        self.user_entropy = Some(Zeroizing::new(entropy.to_vec()));
        self
    }

    pub fn with_mode(mut self, mode: DerivationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn with_code_options(mut self, options: CodeOptions) -> Self {
        self.code_options = options;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(WalletError::InvalidRequest("count must be at least 1".to_string()))
        }
        if self.address_types.is_empty() {
            return Err(WalletError::InvalidRequest("no address types requested".to_string()))
        }
        for (i, t) in self.address_types.iter().enumerate() {
            if self.address_types[..i].contains(t) {
                return Err(WalletError::InvalidRequest(format!("address type {} requested twice", t)))
            }
        }
        if let Some(p) = &self.passphrase {
            if p.is_empty() {
                return Err(WalletError::InvalidRequest("passphrase is empty".to_string()))
            }
        }

        Ok(())
    }
}

impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("GenerationRequest")
         .field("address_types", &self.address_types)
         .field("count", &self.count)
         .field("encrypted", &self.passphrase.is_some())
         .field("user_entropy", &self.user_entropy.is_some())
         .field("mode", &self.mode)
         .field("kdf", &self.kdf)
         .field("code_options", &self.code_options)
         .finish()
    }
}

/**
    Generates wallet records for one coin from an entropy source.
*/
pub struct Generator<E: EntropySource> {
    params: CoinParams,
    entropy: E
}

impl<E: EntropySource> Generator<E> {
    pub fn new(params: CoinParams, entropy: E) -> Self {
        Self { params, entropy }
    }

    pub fn params(&self) -> &CoinParams {
        &self.params
    }

    /**
        Generates a single wallet. The request count is ignored.
    */
    pub fn generate(&self, request: &GenerationRequest) -> Result<WalletRecord> {
        request.validate()?;
        let encryptor = self.encryptor(request)?;
        let seed = Seed::generate(&self.entropy, request.user_entropy.as_deref().map(|e| e.as_slice()))?;

        let transparent = match request.mode {
            DerivationMode::Random => None,
            DerivationMode::Seeded => Some(seed.transparent_stream())
        };
        let source: &dyn EntropySource = match &transparent {
            Some(stream) => stream,
            None => &self.entropy
        };

        self.wallet(&seed, 0, source, request, encryptor.as_ref())
    }

    /**
        Generates request.count wallets.

        The outer error is reserved for a bad request or an unreachable entropy
        source. Any other failure only affects the wallet it happened in.
    */
    pub fn generate_batch(&self, request: &GenerationRequest) -> Result<Vec<Result<WalletRecord>>> {
        request.validate()?;
        tracing::info!(
            count = request.count,
            mode = ?request.mode,
            network = %self.params.network_id(),
            "generating wallet batch"
        );

        match request.mode {
            DerivationMode::Random => {
                let encryptor = self.encryptor(request)?;
                self.random_range(0..request.count, request, encryptor.as_ref())
            },
            DerivationMode::Seeded => {
                let seed = Seed::generate(&self.entropy, request.user_entropy.as_deref().map(|e| e.as_slice()))?;
                self.seeded_batch(&seed, request)
            }
        }
    }

    /**
        Generates a random mode batch split over scoped worker threads.
        Seeded batches are generated sequentially.
    */
    pub fn generate_batch_parallel(&self, request: &GenerationRequest, threads: usize) -> Result<Vec<Result<WalletRecord>>> {
        if request.mode == DerivationMode::Seeded || threads <= 1 {
            return self.generate_batch(request)
        }
        request.validate()?;
        let encryptor = self.encryptor(request)?;

        let ranges = split_ranges(request.count, threads);
        tracing::info!(count = request.count, threads = ranges.len(), "generating wallet batch in parallel");

        let chunks: Vec<Result<Vec<Result<WalletRecord>>>> = thread::scope(|s| {
            let handles: Vec<_> = ranges.into_iter()
                .map(|range| {
                    let encryptor = encryptor.as_ref();
                    s.spawn(move || self.random_range(range, request, encryptor))
                })
                .collect();

            handles.into_iter()
                .map(|h| match h.join() {
                    Ok(x) => x,
                    Err(_) => Err(WalletError::WorkerFailed("generation thread panicked".to_string()))
                })
                .collect()
        });

        let mut records = Vec::new();
        for chunk in chunks {
            records.extend(chunk?);
        }

        Ok(records)
    }

    /**
        Seeded mode batch from a caller supplied seed.
        The seed must be 32 to 252 bytes.
    */
    pub fn generate_from_seed(&self, seed: &[u8], request: &GenerationRequest) -> Result<Vec<Result<WalletRecord>>> {
        request.validate()?;
        let seed = Seed::from_bytes(seed)?;
        self.seeded_batch(&seed, request)
    }

    /**
        Builds a record from keys the caller already holds, encrypting the
        private keys if a passphrase is given.
    */
    pub fn record_from_keys(&self, keys: &[WalletKey], passphrase: Option<(&str, KdfParams)>, options: CodeOptions) -> Result<WalletRecord> {
        let encryptor = match passphrase {
            Some((_, kdf)) => Some(PassphraseEncryptor::new(self.params.clone(), kdf)?),
            None => None
        };
        let passphrase = passphrase.map(|(p, _)| p);

        self.assemble(keys, passphrase.zip(encryptor.as_ref()), options)
    }

    fn encryptor(&self, request: &GenerationRequest) -> Result<Option<PassphraseEncryptor>> {
        match &request.passphrase {
            Some(_) => match PassphraseEncryptor::new(self.params.clone(), request.kdf) {
                Ok(x) => Ok(Some(x)),
                Err(e) => Err(WalletError::InvalidRequest(e.to_string()))
            },
            None => Ok(None)
        }
    }

    fn random_range(
        &self,
        range: Range<u32>,
        request: &GenerationRequest,
        encryptor: Option<&PassphraseEncryptor>
    ) -> Result<Vec<Result<WalletRecord>>> {
        let mut records = Vec::new();
        for i in range {
            let seed = Seed::generate(&self.entropy, request.user_entropy.as_deref().map(|e| e.as_slice()))?;
            let record = self.wallet(&seed, 0, &self.entropy, request, encryptor);
            records.push(check_wallet(i, record)?);
        }

        Ok(records)
    }

    fn seeded_batch(&self, seed: &Seed, request: &GenerationRequest) -> Result<Vec<Result<WalletRecord>>> {
        let encryptor = self.encryptor(request)?;
        let stream = seed.transparent_stream();

        let mut records = Vec::new();
        for i in 0..request.count {
            let record = self.wallet(seed, i, &stream, request, encryptor.as_ref());
            records.push(check_wallet(i, record)?);
        }

        Ok(records)
    }

    fn wallet(
        &self,
        seed: &Seed,
        account: u32,
        transparent: &dyn EntropySource,
        request: &GenerationRequest,
        encryptor: Option<&PassphraseEncryptor>
    ) -> Result<WalletRecord> {
        let mut keys: Vec<WalletKey> = Vec::with_capacity(request.address_types.len());
        for address_type in &request.address_types {
            keys.push(match address_type {
                AddressType::Transparent => TransparentKeyPair::generate(transparent)?.into(),
                AddressType::Shielded => ShieldedKeys::derive(seed, &self.params, account)?.into()
            });
        }

        let passphrase = request.passphrase.as_ref().map(|p| p.as_str());
        self.assemble(&keys, passphrase.zip(encryptor), request.code_options.clone())
    }

    fn assemble(
        &self,
        keys: &[WalletKey],
        encryption: Option<(&str, &PassphraseEncryptor)>,
        options: CodeOptions
    ) -> Result<WalletRecord> {
        let mut builder = RecordBuilder::new(self.params.clone()).options(options);
        for key in keys {
            let entry = match encryption {
                Some((passphrase, encryptor)) => WalletEntry::encrypted(key, encryptor, passphrase)?,
                None => WalletEntry::plain(key, &self.params)?
            };
            tracing::debug!(address = %entry.address, address_type = %entry.address_type, "derived wallet entry");
            builder = builder.entry(entry);
        }

        builder.build()
    }
}

/**
    Splits wallet indexes 0..count into at most threads contiguous, non-empty ranges.
*/
fn split_ranges(count: u32, threads: usize) -> Vec<Range<u32>> {
    let threads = (threads.max(1) as u64).min(count as u64).max(1);
    let per_thread = (count as u64).div_ceil(threads);

    (0..threads)
        .map(|t| {
            let start = (t * per_thread).min(count as u64) as u32;
            let end = ((t + 1) * per_thread).min(count as u64) as u32;
            start..end
        })
        .filter(|r| !r.is_empty())
        .collect()
}

/**
    Entropy failures abort the batch, anything else is kept as that wallet's result.
*/
fn check_wallet(index: u32, record: Result<WalletRecord>) -> Result<Result<WalletRecord>> {
    match record {
        Err(WalletError::EntropyUnavailable(e)) => Err(WalletError::EntropyUnavailable(e)),
        Err(e) => {
            tracing::warn!(wallet = index, error = %e, "wallet generation failed");
            Ok(Err(e))
        },
        Ok(r) => Ok(Ok(r))
    }
}

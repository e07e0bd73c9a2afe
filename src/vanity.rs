/*
    Vanity shielded addresses.

    The first characters of a Sapling address's data part encode the
    diversifier, so the search only needs FF1 evaluations until the prefix
    bits match. Each worker owns a freshly seeded spending key and walks its
    diversifier indexes; the first hit raises a shared stop flag.
*/

use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc
};
use std::thread;

use crate::{
    encoding::bech32::{self, CHARSET},
    entropy::{EntropySource, Seed},
    error::{Result, WalletError},
    params::CoinParams,
    shielded::ShieldedKeys
};

/// Diversifier indexes a worker tries between progress reports
pub const REPORT_INTERVAL: u64 = 5000;

/// Whole characters of the data part fixed by the 88 bit diversifier
pub const MAX_PREFIX_LENGTH: usize = 17;

enum WorkerMessage {
    Progress(u64),
    Found(Box<ShieldedKeys>),
    Failed(WalletError),
    Finished
}

/// A successful search
#[derive(Debug, Clone)]
pub struct VanityResult {
    pub keys: ShieldedKeys,
    /// Diversifier indexes tried across all workers
    pub attempts: u64
}

/**
    Parses a prefix into 5 bit values. A leading "<hrp>1" is ignored.
*/
pub fn parse_prefix(prefix: &str, params: &CoinParams) -> Result<Vec<u8>> {
    let hrp_part = format!("{}1", params.zaddress_hrp);
    let data = prefix.strip_prefix(hrp_part.as_str()).unwrap_or(prefix);

    if data.is_empty() || data.len() > MAX_PREFIX_LENGTH {
        return Err(WalletError::InvalidVanityPrefix(format!(
            "{:?} must be 1 to {} characters", prefix, MAX_PREFIX_LENGTH
        )))
    }

    data.chars()
        .map(|c| match CHARSET.find(c) {
            Some(v) => Ok(v as u8),
            None => Err(WalletError::InvalidVanityPrefix(format!(
                "{:?} is not a bech32 character, note that 'b', 'i', 'o' and '1' never appear", c
            )))
        })
        .collect()
}

/**
    True if the bech32 groups of the diversifier start with the given values.
*/
fn diversifier_matches(d: &[u8; 11], values: &[u8]) -> bool {
    values.iter().enumerate().all(|(i, v)| {
        let bit = i * 5;
        let byte = bit / 8;
        let window = ((d[byte] as u16) << 8) | d.get(byte + 1).map_or(0, |b| *b as u16);
        ((window >> (11 - bit % 8)) & 0x1f) as u8 == *v
    })
}

/**
    Searches for a shielded address whose data part starts with prefix.

    threads workers each try up to max_attempts / threads diversifier indexes.
    on_progress is called with the running attempt total.
*/
pub fn search(
    prefix: &str,
    threads: usize,
    max_attempts: u64,
    params: &CoinParams,
    entropy: &dyn EntropySource,
    on_progress: &mut dyn FnMut(u64)
) -> Result<VanityResult> {
    let values = parse_prefix(prefix, params)?;
    let data_prefix: String = values.iter().map(|v| CHARSET.as_bytes()[*v as usize] as char).collect();
    let threads = threads.max(1);
    let per_worker = max_attempts / threads as u64 + u64::from(max_attempts % threads as u64 != 0);

    let mut seeds = Vec::with_capacity(threads);
    for _ in 0..threads {
        seeds.push(Seed::generate(entropy, None)?);
    }

    tracing::info!(prefix, threads, max_attempts, "starting vanity search");
    let stop = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel();

    thread::scope(|s| {
        for seed in &seeds {
            let tx = tx.clone();
            let (values, data_prefix, stop) = (&values, &data_prefix, &stop);
            s.spawn(move || {
                let message = match worker(seed, params, values, data_prefix, per_worker, stop, &tx) {
                    Ok(Some(keys)) => WorkerMessage::Found(Box::new(keys)),
                    Ok(None) => WorkerMessage::Finished,
                    Err(e) => WorkerMessage::Failed(e)
                };
                let _ = tx.send(message);
            });
        }
        drop(tx);

        let mut attempts: u64 = 0;
        let mut outcome: Option<Result<VanityResult>> = None;
        for message in rx.iter() {
            match message {
                WorkerMessage::Progress(n) => {
                    attempts += n;
                    on_progress(attempts);
                },
                WorkerMessage::Found(keys) if outcome.is_none() => {
                    stop.store(true, Ordering::Relaxed);
                    outcome = Some(Ok(VanityResult { keys: *keys, attempts: 0 }));
                },
                WorkerMessage::Failed(e) if outcome.is_none() => {
                    stop.store(true, Ordering::Relaxed);
                    outcome = Some(Err(e));
                },
                _ => ()
            }
        }

        match outcome {
            Some(Ok(mut found)) => {
                found.attempts = attempts;
                tracing::info!(attempts, "vanity address found");
                Ok(found)
            },
            Some(Err(e)) => Err(e),
            None => Err(WalletError::VanityNotFound(attempts))
        }
    })
}

/**
    Walks the diversifier indexes of one seed's account key.
    Returns None if the share of attempts ran out or another worker won.
*/
fn worker(
    seed: &Seed,
    params: &CoinParams,
    values: &[u8],
    data_prefix: &str,
    max_attempts: u64,
    stop: &AtomicBool,
    tx: &mpsc::Sender<WorkerMessage>
) -> Result<Option<ShieldedKeys>> {
    let keys = ShieldedKeys::derive(seed, params, 0)?;
    let dk = keys.viewing_key().diversifier_key();

    let mut unreported: u64 = 0;
    for index in 0..max_attempts {
        let d = dk.diversifier(index)?;
        unreported += 1;

        if diversifier_matches(&d.0, values) && d.is_valid() {
            let found = keys.at_index(index)?;
            if bech32::data_part(&found.address_text(params)?).starts_with(data_prefix) {
                let _ = tx.send(WorkerMessage::Progress(unreported));
                return Ok(Some(found))
            }
        }

        if unreported == REPORT_INTERVAL {
            let _ = tx.send(WorkerMessage::Progress(unreported));
            unreported = 0;
            if stop.load(Ordering::Relaxed) {
                return Ok(None)
            }
        }
    }

    if unreported > 0 {
        let _ = tx.send(WorkerMessage::Progress(unreported));
    }

    Ok(None)
}

/**
    Expected diversifier indexes to try before a prefix of this length matches
    (one in 32^len, with about half of all diversifiers valid).
*/
pub fn expected_attempts(prefix_len: usize) -> f64 {
    2.0 * 32f64.powi(prefix_len as i32)
}

/*
    Sources of randomness for key generation.

    The OS CSPRNG is the only source used in production. There is no fallback:
    if the OS generator cannot be read, generation fails with EntropyUnavailable.
    A deterministic ChaCha20 source exists for tests and for the seeded
    derivation mode, where every key of a batch is drawn from a stream keyed by
    the batch seed.
*/

use std::fmt;
use std::sync::Mutex;
use zeroize::Zeroizing;

use crate::{
    ChaCha20Rng,
    OsRng,
    RngCore,
    SeedableRng,
    error::{Result, WalletError},
    hash
};

/// Default length of generated seeds in bytes.
pub const SEED_LENGTH: usize = 32;
/// ZIP-32 bounds on the master seed length.
pub const MIN_SEED_LENGTH: usize = 32;
pub const MAX_SEED_LENGTH: usize = 252;

/**
    Supplies cryptographically secure random bytes.
    Implementations must be safe to share between generation threads.
*/
pub trait EntropySource: Send + Sync {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()>;

    fn next_bytes(&self, n: usize) -> Result<Zeroizing<Vec<u8>>> {
        let mut bytes = Zeroizing::new(vec![0u8; n]);
        self.fill_bytes(&mut bytes)?;
        Ok(bytes)
    }
}

/**
    The operating system CSPRNG.
*/
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()> {
        OsRng.try_fill_bytes(dest)
            .map_err(|e| WalletError::EntropyUnavailable(e.to_string()))
    }
}

/**
    Deterministic ChaCha20 stream.
*/
pub struct SeededEntropy {
    rng: Mutex<ChaCha20Rng>
}

impl SeededEntropy {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { rng: Mutex::new(ChaCha20Rng::from_seed(seed)) }
    }

    pub fn from_u64(state: u64) -> Self {
        Self { rng: Mutex::new(ChaCha20Rng::seed_from_u64(state)) }
    }
}

impl EntropySource for SeededEntropy {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()> {
        let mut rng = match self.rng.lock() {
            Ok(x) => x,
            Err(_) => return Err(WalletError::EntropyUnavailable("seeded stream lock poisoned".to_string()))
        };
        rng.fill_bytes(dest);
        Ok(())
    }
}

impl fmt::Debug for SeededEntropy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SeededEntropy").finish_non_exhaustive()
    }
}

/**
    Secret seed bytes owned by a single generation session.
    Zeroized when dropped.
*/
#[derive(Clone)]
pub struct Seed(Zeroizing<Vec<u8>>);

impl Seed {
    /**
        Draws a fresh seed from the entropy source.

        If user entropy is supplied the seed is SHA256d(os bytes || user bytes),
        so the result is never weaker than the OS bytes alone.
    */
    pub fn generate(source: &dyn EntropySource, user_entropy: Option<&[u8]>) -> Result<Self> {
        let os_bytes = source.next_bytes(SEED_LENGTH)?;

        match user_entropy {
            Some(extra) if !extra.is_empty() => {
                let mut mixed = Zeroizing::new(Vec::with_capacity(os_bytes.len() + extra.len()));
                mixed.extend_from_slice(&os_bytes);
                mixed.extend_from_slice(extra);
                Ok(Self(Zeroizing::new(hash::sha256d(&*mixed).to_vec())))
            },
            _ => Ok(Self(os_bytes))
        }
    }

    /**
        Use caller supplied seed bytes. The length must be within the
        bounds ZIP-32 allows for a master seed.
    */
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_SEED_LENGTH || bytes.len() > MAX_SEED_LENGTH {
            return Err(WalletError::InvalidKeyMaterial(format!(
                "seed must be {} to {} bytes, found {}", MIN_SEED_LENGTH, MAX_SEED_LENGTH, bytes.len()
            )))
        }
        Ok(Self(Zeroizing::new(bytes.to_vec())))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /**
        Deterministic stream keyed by this seed, used to draw transparent keys
        in the seeded derivation mode. The stream key is domain separated from
        the seed itself.
    */
    pub fn transparent_stream(&self) -> SeededEntropy {
        let mut tagged = Zeroizing::new(b"transparent".to_vec());
        tagged.extend_from_slice(self.as_bytes());
        let key = Zeroizing::new(hash::sha256d(&*tagged));
        SeededEntropy::from_seed(*key)
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Seed(<{} bytes redacted>)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenEntropy;

    impl EntropySource for BrokenEntropy {
        fn fill_bytes(&self, _dest: &mut [u8]) -> Result<()> {
            Err(WalletError::EntropyUnavailable("no device".to_string()))
        }
    }

    #[test]
    fn os_entropy_fills_requested_length() {
        let a = OsEntropy.next_bytes(48).unwrap();
        let b = OsEntropy.next_bytes(48).unwrap();
        assert_eq!(a.len(), 48);
        assert_ne!(*a, *b);
    }

    #[test]
    fn seeded_entropy_is_deterministic() {
        let a = SeededEntropy::from_u64(7).next_bytes(32).unwrap();
        let b = SeededEntropy::from_u64(7).next_bytes(32).unwrap();
        let c = SeededEntropy::from_u64(8).next_bytes(32).unwrap();
        assert_eq!(*a, *b);
        assert_ne!(*a, *c);
    }

    #[test]
    fn user_entropy_changes_seed() {
        let plain = Seed::generate(&SeededEntropy::from_u64(1), None).unwrap();
        let mixed = Seed::generate(&SeededEntropy::from_u64(1), Some(b"dice rolls 4 6 1")).unwrap();
        let empty = Seed::generate(&SeededEntropy::from_u64(1), Some(b"")).unwrap();

        assert_eq!(plain.as_bytes().len(), SEED_LENGTH);
        assert_eq!(mixed.as_bytes().len(), SEED_LENGTH);
        assert_ne!(plain.as_bytes(), mixed.as_bytes());
        assert_eq!(plain.as_bytes(), empty.as_bytes());
    }

    #[test]
    fn unavailable_source_is_an_error() {
        assert!(matches!(Seed::generate(&BrokenEntropy, None), Err(WalletError::EntropyUnavailable(_))));
    }

    #[test]
    fn seed_length_bounds() {
        assert!(Seed::from_bytes(&[1u8; 31]).is_err());
        assert!(Seed::from_bytes(&[1u8; 253]).is_err());
        assert!(Seed::from_bytes(&[1u8; 32]).is_ok());
        assert!(Seed::from_bytes(&[1u8; 252]).is_ok());
    }

    #[test]
    fn seed_debug_is_redacted() {
        let seed = Seed::from_bytes(&[0xAB; 32]).unwrap();
        assert!(!format!("{:?}", seed).contains("ab"));
        assert!(!format!("{:?}", seed).contains("171"));
    }
}

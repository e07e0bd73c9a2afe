/*
    Error type shared by every part of the library.

    Decode-time failures (checksum, network) and decrypt-time failures
    (passphrase) are distinct variants so callers can match on them.
*/

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("OS entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("no valid diversifier in the first {0} indices")]
    DiversifierExhausted(u64),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("network mismatch: expected {expected}, found {found}")]
    NetworkMismatch { expected: String, found: String },

    #[error("wrong passphrase")]
    WrongPassphrase,

    #[error("malformed wallet entry: {0}")]
    MalformedEntry(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("bad derivation path: {0}")]
    BadPath(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("invalid generation request: {0}")]
    InvalidRequest(String),

    #[error("generation worker failed: {0}")]
    WorkerFailed(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid vanity prefix: {0}")]
    InvalidVanityPrefix(String),

    #[error("no matching address found after {0} attempts")]
    VanityNotFound(u64),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WalletError>;

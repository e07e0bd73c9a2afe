/*
    This module contains the default imports for the library.

    Import the library using:
        use zec_paperwallet::prelude::*;
    to quickly import the essential parts of the library.
*/

pub use crate::{

    key::{
        PubKey,
        PrivKey,
        TransparentKeyPair
    },

    address::TransparentAddress,

    shielded::{
        ShieldedKeys,
        address::{
            Diversifier,
            DiversifierKey,
            PaymentAddress
        },
        keys::{
            ExtendedSpendingKey,
            ExtendedFullViewingKey,
            FullViewingKey
        },
        path::{
            ChildOptions,
            Path
        }
    },

    entropy::{
        EntropySource,
        OsEntropy,
        SeededEntropy,
        Seed
    },

    encrypt::{
        CancelToken,
        EncryptedPrivateKey,
        KdfParams,
        PassphraseEncryptor
    },

    record::{
        CodeOptions,
        KeyText,
        RecordBuilder,
        ScanCode,
        WalletEntry,
        WalletRecord
    },

    generator::{
        DerivationMode,
        GenerationRequest,
        Generator
    },

    wallet_key::{
        AddressType,
        WalletKey
    },

    error::{
        Result,
        WalletError
    },

    params::CoinParams,

    util::Network

};

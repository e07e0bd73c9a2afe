use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use zec_paperwallet::prelude::*;

const BOTH: [AddressType; 2] = [AddressType::Transparent, AddressType::Shielded];

fn cheap_kdf() -> KdfParams {
    KdfParams::new(8, 8, 1).unwrap()
}

/// Decodes every entry of a record back to its key and checks it reproduces the address
fn assert_round_trips(record: &WalletRecord, params: &CoinParams) {
    for entry in record.entries() {
        match (entry.address_type, &entry.private_key) {
            (AddressType::Transparent, KeyText::Plain(wif)) => {
                let pair = TransparentKeyPair::from_private_key(PrivKey::from_wif(wif, params).unwrap());
                let decoded = TransparentAddress::decode(&entry.address, params).unwrap();
                assert_eq!(decoded.hash(), &pair.public_key().hash160());
            },
            (AddressType::Shielded, KeyText::Plain(text)) => {
                let xfvk = ExtendedSpendingKey::decode(text, params).unwrap().to_extended_full_viewing_key().unwrap();
                let address = PaymentAddress::decode(&entry.address, params).unwrap();
                assert!(address.diversifier().is_valid());
                assert!(xfvk.address_index(&address).unwrap().is_some());
                assert_eq!(entry.viewing_key.as_deref(), Some(xfvk.encode(params).unwrap().as_str()));
            },
            (_, KeyText::Encrypted(_)) => panic!("expected plain keys")
        }
    }
}

#[test]
fn batch_of_fifty_mixed_wallets() {
    let params = CoinParams::mainnet();
    let generator = Generator::new(params.clone(), OsEntropy);
    let request = GenerationRequest::new(&BOTH, 50).with_mode(DerivationMode::Random);

    let records = generator.generate_batch_parallel(&request, 4).unwrap();
    assert_eq!(records.len(), 50);

    let mut keys = HashSet::new();
    for record in &records {
        let record = record.as_ref().unwrap();
        assert_eq!(record.entries().len(), 2);
        assert_eq!(record.codes().len(), 2);
        assert_round_trips(record, &params);

        for entry in record.entries() {
            assert!(keys.insert(entry.private_key.as_str().to_string()), "duplicate private key");
        }
    }
}

#[test]
fn hd_batch_round_trips() {
    let params = CoinParams::testnet();
    let generator = Generator::new(params.clone(), OsEntropy);
    let records = generator.generate_batch(&GenerationRequest::new(&BOTH, 5)).unwrap();

    let mut addresses = HashSet::new();
    for record in &records {
        let record = record.as_ref().unwrap();
        assert_eq!(record.network_id(), "zcash-test");
        assert_round_trips(record, &params);
        for entry in record.entries() {
            assert!(addresses.insert(entry.address.clone()));
        }
    }
}

#[test]
fn single_mainnet_transparent_wallet() {
    let params = CoinParams::mainnet();
    let generator = Generator::new(params.clone(), OsEntropy);
    let records = generator.generate_batch(&GenerationRequest::new(&[AddressType::Transparent], 1)).unwrap();

    assert_eq!(records.len(), 1);
    let record = records[0].as_ref().unwrap();
    assert_eq!(record.entries().len(), 1);

    let entry = &record.entries()[0];
    assert!(entry.address.starts_with("t1"));
    let pair = TransparentKeyPair::from_private_key(PrivKey::from_wif(entry.private_key.as_str(), &params).unwrap());
    assert_eq!(pair.address().encode(&params), entry.address);
}

#[test]
fn correct_and_wrong_horse() {
    let params = CoinParams::mainnet();
    let generator = Generator::new(params.clone(), OsEntropy);
    let request = GenerationRequest::new(&BOTH, 1)
        .with_passphrase("correct horse")
        .with_kdf(cheap_kdf());
    let record = generator.generate(&request).unwrap();

    let encryptor = PassphraseEncryptor::new(params.clone(), cheap_kdf()).unwrap();
    for entry in record.entries() {
        assert!(entry.private_key.is_encrypted());

        let key = encryptor.decrypt_text(entry.private_key.as_str(), "correct horse").unwrap();
        assert_eq!(key.address_text(&params).unwrap(), entry.address);

        assert!(matches!(
            encryptor.decrypt_text(entry.private_key.as_str(), "wrong horse"),
            Err(WalletError::WrongPassphrase)
        ));
    }
}

#[test]
fn random_wrong_passphrases_fail() {
    let params = CoinParams::mainnet();
    let encryptor = PassphraseEncryptor::new(params.clone(), cheap_kdf()).unwrap();
    let key: WalletKey = TransparentKeyPair::generate(&OsEntropy).unwrap().into();
    let address = key.address_text(&params).unwrap();
    let encrypted = encryptor.encrypt(&key, "the right one", &address).unwrap();

    let mut rng = ChaCha20Rng::seed_from_u64(42);
    for _ in 0..20 {
        let len = rng.gen_range(1..24);
        let guess: String = (0..len).map(|_| rng.gen_range(b'!'..=b'~') as char).collect();
        if guess == "the right one" {
            continue
        }
        assert!(matches!(encryptor.decrypt(&encrypted, &guess), Err(WalletError::WrongPassphrase)));
    }
}

#[test]
fn cross_network_decoding_fails() {
    let main = CoinParams::mainnet();
    let test = CoinParams::testnet();
    let generator = Generator::new(main.clone(), OsEntropy);
    let record = generator.generate(&GenerationRequest::new(&BOTH, 1)).unwrap();

    for entry in record.entries() {
        match entry.address_type {
            AddressType::Transparent => {
                assert!(matches!(
                    TransparentAddress::decode(&entry.address, &test),
                    Err(WalletError::NetworkMismatch { .. })
                ));
                assert!(PrivKey::from_wif(entry.private_key.as_str(), &test).is_err());
            },
            AddressType::Shielded => {
                assert!(matches!(
                    PaymentAddress::decode(&entry.address, &test),
                    Err(WalletError::NetworkMismatch { .. })
                ));
                assert!(matches!(
                    ExtendedSpendingKey::decode(entry.private_key.as_str(), &test),
                    Err(WalletError::NetworkMismatch { .. })
                ));
            }
        }
    }

    //A record built for one network rejects entries from the other
    let entries = record.entries().to_vec();
    assert!(matches!(
        RecordBuilder::new(test).entries(entries).build(),
        Err(WalletError::MalformedEntry(_))
    ));
}

#[test]
fn seeded_generation_is_reproducible() {
    let params = CoinParams::mainnet();
    let seed = [0x5au8; 64];
    let request = GenerationRequest::new(&BOTH, 3);

    let first = Generator::new(params.clone(), OsEntropy).generate_from_seed(&seed, &request).unwrap();
    let second = Generator::new(params, SeededEntropy::from_u64(1)).generate_from_seed(&seed, &request).unwrap();

    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.as_ref().unwrap().entries(), b.as_ref().unwrap().entries());
    }
}

#[test]
fn custom_coin_params() {
    let params = CoinParams::from_json(r#"{
        "name": "hush",
        "network": "mainnet",
        "taddress_version": [28, 184],
        "tsecret_prefix": 188,
        "zaddress_hrp": "zs",
        "zsecret_hrp": "secret-extended-key-main",
        "zviewkey_hrp": "zviews",
        "coin_type": 133
    }"#).unwrap();

    let generator = Generator::new(params.clone(), OsEntropy);
    let record = generator.generate(&GenerationRequest::new(&BOTH, 1)).unwrap();
    assert_eq!(record.network_id(), "hush-main");
    assert_round_trips(&record, &params);

    let shielded = record.entries().iter().find(|e| e.address_type == AddressType::Shielded).unwrap();
    assert!(shielded.viewing_key.as_deref().unwrap().starts_with("zviews1"));
    //No URI scheme, the code is the bare address
    assert_eq!(record.codes()[0].address, record.entries()[0].address);
}

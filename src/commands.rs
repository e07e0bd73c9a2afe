use clap::Subcommand;
use qrcode::{QrCode, render::unicode};
use std::{
    fs,
    io::{self, BufRead, IsTerminal, Write},
    path::PathBuf,
    time::Instant
};
use zec_paperwallet::{prelude::*, vanity};

#[derive(Subcommand)]
pub enum Commands {
    /// Generate paper wallets
    Generate {
        #[arg(short, long, default_value = "1", help = "Number of wallets to generate")]
        count: u32,
        #[arg(short, long, help = "Include a transparent address in every wallet")]
        transparent: bool,
        #[arg(short = 'z', long, help = "Include a shielded address in every wallet (default)")]
        shielded: bool,
        #[arg(long, help = "Use testnet instead of mainnet")]
        testnet: bool,
        #[arg(long, help = "JSON file with the parameters of another coin")]
        params: Option<PathBuf>,
        #[arg(short, long, help = "Encrypt the private keys with this passphrase")]
        passphrase: Option<String>,
        #[arg(long, help = "Use a fresh seed for every wallet instead of one HD seed")]
        nohd: bool,
        #[arg(short, long, help = "Additional entropy mixed into the seed")]
        entropy: Option<String>,
        #[arg(long, help = "Print the scannable codes")]
        qr: bool,
        #[arg(short, long, help = "Write the records to this file instead of stdout")]
        output: Option<PathBuf>,
        #[arg(long, default_value = "1", help = "Worker threads, only used with --nohd")]
        threads: usize,
    },
    /// Decrypt a passphrase encrypted private key
    Decrypt {
        #[arg(short, long, help = "Encrypted private key text")]
        key: String,
        #[arg(short, long, help = "Passphrase the key was encrypted with")]
        passphrase: String,
        #[arg(long, help = "Use testnet instead of mainnet")]
        testnet: bool,
        #[arg(long, help = "JSON file with the parameters of another coin")]
        params: Option<PathBuf>,
    },
    /// Search for a shielded address starting with a prefix
    Vanity {
        #[arg(long, help = "Characters the address should start with after the prefix")]
        prefix: String,
        #[arg(long, default_value = "4", help = "Number of CPU threads to use")]
        threads: usize,
        #[arg(long, default_value = "1000000000000", help = "Give up after this many attempts")]
        max_attempts: u64,
        #[arg(short, long, help = "Encrypt the private key with this passphrase")]
        passphrase: Option<String>,
        #[arg(long, help = "Use testnet instead of mainnet")]
        testnet: bool,
        #[arg(long, help = "JSON file with the parameters of another coin")]
        params: Option<PathBuf>,
    },
}

pub fn execute_command(command: Commands) -> Result<()> {
    match command {
        Commands::Generate { count, transparent, shielded, testnet, params, passphrase, nohd, entropy, qr, output, threads } => {
            let params = load_params(testnet, params)?;

            let mut address_types = vec![];
            if shielded || !transparent {
                address_types.push(AddressType::Shielded);
            }
            if transparent {
                address_types.push(AddressType::Transparent);
            }

            let mode = match nohd {
                true => DerivationMode::Random,
                false => DerivationMode::Seeded
            };
            let mut request = GenerationRequest::new(&address_types, count).with_mode(mode);
            if let Some(p) = &passphrase {
                request = request.with_passphrase(p);
            }
            let user_entropy = match entropy {
                Some(e) => e,
                None => prompt_entropy()?
            };
            if !user_entropy.is_empty() {
                request = request.with_user_entropy(user_entropy.as_bytes());
            }

            let generator = Generator::new(params, OsEntropy);
            let (records, failure) = split_results(generator.generate_batch_parallel(&request, threads)?);

            let json = serde_json::to_string_pretty(&records)?;
            match &output {
                Some(path) => {
                    fs::write(path, json)?;
                    println!("Wrote {} wallets to {}", records.len(), path.display());
                },
                None => println!("{}", json)
            }

            if qr {
                for record in &records {
                    for (entry, code) in record.entries().iter().zip(record.codes()) {
                        print_qr_code(&code.address, &format!("{} address", entry.address_type))?;
                        if let Some(key) = &code.private_key {
                            print_qr_code(key, &format!("{} private key", entry.address_type))?;
                        }
                    }
                }
            }

            //The wallets that did succeed are still written out
            if let Some(e) = failure {
                return Err(e)
            }
        },
        Commands::Decrypt { key, passphrase, testnet, params } => {
            let params = load_params(testnet, params)?;
            let encryptor = PassphraseEncryptor::new(params.clone(), KdfParams::default())?;
            let wallet_key = match encryptor.decrypt_text(&key, &passphrase) {
                Ok(x) => x,
                Err(e) => {
                    if let Some(hint) = decrypt_hint(&key, &e) {
                        eprintln!("{}", hint);
                    }
                    return Err(e)
                }
            };

            println!("Address: {}", wallet_key.address_text(&params)?);
            println!("Private key: {}", wallet_key.private_key_text(&params)?);
            if let Some(v) = wallet_key.viewing_key_text(&params)? {
                println!("Viewing key: {}", v);
            }
        },
        Commands::Vanity { prefix, threads, max_attempts, passphrase, testnet, params } => {
            let params = load_params(testnet, params)?;
            let data_len = vanity::parse_prefix(&prefix, &params)?.len();
            let expected = vanity::expected_attempts(data_len);
            let started = Instant::now();

            let mut on_progress = |attempts: u64| {
                let elapsed = started.elapsed().as_secs() + 1;
                let rate = attempts / elapsed;
                let (eta, unit) = pretty_duration(expected / rate.max(1) as f64);
                eprint!("Checking addresses at {}/sec on {} CPU threads. [50% ETA = {} {}]   \r", rate, threads, eta, unit);
                io::stderr().flush().ok();
            };
            let found = vanity::search(&prefix, threads, max_attempts, &params, &OsEntropy, &mut on_progress)?;
            eprintln!();

            let generator = Generator::new(params, OsEntropy);
            let kdf = passphrase.as_deref().map(|p| (p, KdfParams::default()));
            let record = generator.record_from_keys(&[WalletKey::Shielded(found.keys)], kdf, CodeOptions::default())?;
            println!("{}", record.to_json()?);
        },
    }

    Ok(())
}

/**
    Keeps the successful records and reports every failure, returning the
    first one so the command can exit non-zero.
*/
fn split_results(results: Vec<Result<WalletRecord>>) -> (Vec<WalletRecord>, Option<WalletError>) {
    let mut records = vec![];
    let mut failure = None;
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(r) => records.push(r),
            Err(e) => {
                eprintln!("Wallet {} failed: {}", i, e);
                failure.get_or_insert(e);
            }
        }
    }

    (records, failure)
}

fn load_params(testnet: bool, path: Option<PathBuf>) -> Result<CoinParams> {
    match path {
        Some(p) => CoinParams::from_file(p),
        None => match testnet {
            true => Ok(CoinParams::testnet()),
            false => Ok(CoinParams::mainnet())
        }
    }
}

/// Asks for extra entropy when run interactively
fn prompt_entropy() -> Result<String> {
    if !io::stdin().is_terminal() {
        return Ok(String::new())
    }

    eprintln!("Provide additional entropy for generating random numbers. Type in a string of random characters, press [ENTER] when done");
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end().to_string())
}

/**
    Transparent encrypted keys do not record their network, so a missing
    --testnet or --params looks exactly like a wrong passphrase.
*/
fn decrypt_hint(key: &str, error: &WalletError) -> Option<&'static str> {
    match error {
        WalletError::WrongPassphrase if !key.contains("-encrypted1") => Some(
            "Hint: encrypted transparent keys do not record their network. Check --testnet or --params before retrying the passphrase."
        ),
        _ => None
    }
}

fn print_qr_code(data: &str, label: &str) -> Result<()> {
    let code = match QrCode::new(data) {
        Ok(x) => x,
        Err(e) => return Err(WalletError::Encoding(format!("qr code: {}", e)))
    };
    let string = code.render::<unicode::Dense1x2>().dark_color(unicode::Dense1x2::Light).light_color(unicode::Dense1x2::Dark).build();
    println!("{}:\n{}", label, string);
    Ok(())
}

fn pretty_duration(secs: f64) -> (String, &'static str) {
    let steps: [(f64, &str); 5] = [(60.0, "min"), (60.0, "hours"), (24.0, "days"), (30.0, "months"), (12.0, "years")];

    let mut value = secs;
    let mut unit = "sec";
    for (size, next) in steps {
        if value <= size {
            break
        }
        value /= size;
        unit = next;
    }

    (format!("{:.0}", value), unit)
}

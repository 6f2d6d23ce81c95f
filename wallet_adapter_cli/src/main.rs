mod commands;
mod driver;
mod error;

use base64::{engine::general_purpose::STANDARD as Base64Engine, Engine};
use clap::Parser;
use colored::Colorize;
use commands::{Cli, Commands};
use driver::Driver;
use error::AppError;
use log::{debug, info};
use serde_json::{json, Value};
use std::path::Path;
use wallet_adapter_core::{ByteArray, SessionState, Settings, SignedMessage};

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    if let Err(error) = run(cli) {
        eprintln!("{} {}", "ERROR:".red(), error);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let settings = load_config(&cli.config)?;

    // Callbacks land on this thread; the runtime only hosts the blocking waits.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .max_blocking_threads(settings.background_threads)
        .thread_name("wallet-adapter-bg")
        .enable_all()
        .build()?;
    let driver = Driver::new(settings, runtime.handle().clone())?;

    let output = match cli.command {
        Commands::Authorize => {
            driver.authorize()?;
            session_json(&driver.session())
        }
        Commands::Reauthorize { auth_token } => {
            let token = match auth_token {
                Some(token) => token,
                None => driver.authorize()?,
            };
            driver.reauthorize(&token)?;
            session_json(&driver.session())
        }
        Commands::Deauthorize { auth_token } => {
            let token = match auth_token {
                Some(token) => token,
                None => driver.authorize()?,
            };
            driver.deauthorize(&token)?;
            json!({ "deauthorized": token })
        }
        Commands::SignTransactions { transactions } => {
            let transactions = decode_transactions(&transactions)?;
            driver.authorize()?;
            let signed = driver.sign_transactions(&transactions)?;
            json!({ "signed_transactions": encode_base64_all(&signed) })
        }
        Commands::SignAndSend { transactions, min_context_slot } => {
            let transactions = decode_transactions(&transactions)?;
            driver.authorize()?;
            let signatures = driver.sign_and_send(&transactions, min_context_slot)?;
            json!({ "signatures": encode_base58_all(&signatures) })
        }
        Commands::SignMessages { messages, addresses } => {
            let messages: Vec<ByteArray> = messages
                .into_iter()
                .map(|m| ByteArray::from(m.into_bytes()))
                .collect();
            let mut addresses = decode_addresses(&addresses)?;
            driver.authorize()?;
            if addresses.is_empty() {
                addresses.push(ByteArray::from(driver.session().public_key));
            }
            let signed = driver.sign_messages(&messages, &addresses)?;
            json!({ "signed_messages": signed.iter().map(signed_message_json).collect::<Vec<_>>() })
        }
        Commands::Session => {
            driver.authorize()?;
            session_json(&driver.session())
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_config(path: &Path) -> Result<Settings, AppError> {
    if !path.exists() {
        return Err(AppError::Init(format!(
            "Config file not found: {}",
            path.display()
        )));
    }
    info!("Loading config from: {}", path.display());
    let settings = Settings::from_file(&path.to_string_lossy())?;
    settings.validate()?;
    debug!("Using cluster {} as {}", settings.cluster, settings.identity_name);
    Ok(settings)
}

fn decode_transactions(encoded: &[String]) -> Result<Vec<ByteArray>, AppError> {
    encoded
        .iter()
        .enumerate()
        .map(|(i, tx)| {
            Base64Engine
                .decode(tx.trim())
                .map(ByteArray::from)
                .map_err(|e| AppError::Decode(format!("transaction #{}: {}", i, e)))
        })
        .collect()
}

fn decode_addresses(encoded: &[String]) -> Result<Vec<ByteArray>, AppError> {
    encoded
        .iter()
        .map(|address| {
            let bytes = bs58::decode(address.trim())
                .into_vec()
                .map_err(|e| AppError::Decode(format!("address {}: {}", address, e)))?;
            if bytes.len() != 32 {
                return Err(AppError::Validation(format!(
                    "address {} is {} bytes, expected 32",
                    address,
                    bytes.len()
                )));
            }
            Ok(ByteArray::from(bytes))
        })
        .collect()
}

fn encode_base64_all(items: &[ByteArray]) -> Vec<String> {
    items.iter().map(|b| Base64Engine.encode(b.as_slice())).collect()
}

fn encode_base58_all(items: &[ByteArray]) -> Vec<String> {
    items.iter().map(ByteArray::to_base58).collect()
}

fn session_json(session: &SessionState) -> Value {
    json!({
        "auth_token": session.auth_token,
        "public_key": bs58::encode(&session.public_key).into_string(),
        "account_label": session.account_label,
        "wallet_uri_base": session.wallet_uri_base,
    })
}

fn signed_message_json(signed: &SignedMessage) -> Value {
    json!({
        "message": String::from_utf8_lossy(signed.message().as_slice()),
        "signatures": encode_base58_all(signed.signatures()),
        "addresses": encode_base58_all(signed.addresses()),
    })
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "wallet_adapter")]
#[command(about = "Drive a Solana wallet through the callback-based wallet adapter client")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "WALLET_ADAPTER_CONFIG_PATH", default_value = "wallet_adapter.toml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authorize with the wallet and print the authorization
    Authorize,

    /// Reauthorize an existing session
    Reauthorize {
        /// Token to reauthorize. A fresh authorization is made when omitted.
        #[arg(long)]
        auth_token: Option<String>,
    },

    /// Revoke an auth token
    Deauthorize {
        /// Token to revoke. A fresh authorization is made when omitted.
        #[arg(long)]
        auth_token: Option<String>,
    },

    /// Sign base64-encoded transactions without sending them
    SignTransactions {
        #[arg(required = true)]
        transactions: Vec<String>,
    },

    /// Sign base64-encoded transactions and submit them to the cluster
    SignAndSend {
        #[arg(required = true)]
        transactions: Vec<String>,

        /// Minimum slot the wallet should use when submitting
        #[arg(long)]
        min_context_slot: Option<u64>,
    },

    /// Sign UTF-8 messages off-chain
    SignMessages {
        /// Message text, repeatable
        #[arg(short, long = "message", required = true)]
        messages: Vec<String>,

        /// Base58 signer address, repeatable. Defaults to the authorized account.
        #[arg(short, long = "address")]
        addresses: Vec<String>,
    },

    /// Authorize and print the resulting session state
    Session,
}

// Runs wallet requests from the main thread
//
// The main thread is the designated callback context: the client posts every
// callback onto a queue bound here, and each request pumps that queue until
// its outcome arrives.

use crate::error::AppError;
use log::{info, warn};
use solana_sdk::signature::Keypair;
use std::sync::Arc;
use std::time::Duration;
use wallet_adapter_core::{
    outcome_channel, ByteArray, KeypairWallet, MainQueue, MainQueueRunner, Outcome,
    OutcomeReceiver, SessionState, Settings, SignedMessage, TokioExecutor, WalletAdapterClient,
};

/// Base64 keypair env var checked before any configured key source.
pub const KEYPAIR_ENV_VAR: &str = "WALLET_ADAPTER_KEYPAIR_B64";

pub struct Driver {
    client: WalletAdapterClient,
    runner: MainQueueRunner,
    settings: Settings,
    timeout: Duration,
}

impl Driver {
    pub fn new(settings: Settings, runtime: tokio::runtime::Handle) -> Result<Self, AppError> {
        let wallet = build_wallet(&settings)?;
        let (queue, runner) = MainQueue::bind_current_thread();
        let client = WalletAdapterClient::new(Arc::new(wallet))
            .with_executor(Arc::new(TokioExecutor::new(runtime)))
            .with_callback_dispatcher(Arc::new(queue));
        let timeout = Duration::from_secs(settings.callback_timeout_secs);
        Ok(Self { client, runner, settings, timeout })
    }

    pub fn session(&self) -> SessionState {
        self.client.session()
    }

    pub fn authorize(&self) -> Result<String, AppError> {
        let (on_success, on_failure, rx) = outcome_channel();
        let s = &self.settings;
        self.client.authorize(
            &s.identity_uri,
            &s.icon_uri,
            &s.identity_name,
            &s.cluster,
            on_success,
            on_failure,
        );
        self.await_outcome(rx)
    }

    pub fn reauthorize(&self, auth_token: &str) -> Result<String, AppError> {
        let (on_success, on_failure, rx) = outcome_channel();
        let s = &self.settings;
        self.client.reauthorize(
            &s.identity_uri,
            &s.icon_uri,
            &s.identity_name,
            auth_token,
            on_success,
            on_failure,
        );
        self.await_outcome(rx)
    }

    pub fn deauthorize(&self, auth_token: &str) -> Result<(), AppError> {
        let (on_success, on_failure, rx) = outcome_channel();
        self.client.deauthorize(auth_token, on_success, on_failure);
        self.await_outcome(rx)
    }

    pub fn sign_transactions(&self, transactions: &[ByteArray]) -> Result<Vec<ByteArray>, AppError> {
        let (on_success, on_failure, rx) = outcome_channel();
        self.client.sign_transactions(transactions, on_success, on_failure);
        self.await_outcome(rx)
    }

    pub fn sign_and_send(
        &self,
        transactions: &[ByteArray],
        min_context_slot: Option<u64>,
    ) -> Result<Vec<ByteArray>, AppError> {
        let (on_success, on_failure, rx) = outcome_channel();
        self.client
            .sign_and_send_transactions(transactions, min_context_slot, on_success, on_failure);
        self.await_outcome(rx)
    }

    pub fn sign_messages(
        &self,
        messages: &[ByteArray],
        addresses: &[ByteArray],
    ) -> Result<Vec<SignedMessage>, AppError> {
        let (on_success, on_failure, rx) = outcome_channel();
        self.client
            .sign_messages_detached(messages, addresses, on_success, on_failure);
        self.await_outcome(rx)
    }

    fn await_outcome<T>(&self, mut rx: OutcomeReceiver<T>) -> Result<T, AppError> {
        let mut outcome = None;
        self.runner.run_until(
            || {
                if outcome.is_none() {
                    outcome = rx.try_take();
                }
                outcome.is_some()
            },
            self.timeout,
        );
        match outcome {
            Some(Outcome::Success(value)) => Ok(value),
            Some(Outcome::Failure(message)) => Err(AppError::Wallet(message)),
            None => Err(AppError::Timeout(self.timeout.as_secs())),
        }
    }
}

fn build_wallet(settings: &Settings) -> Result<KeypairWallet, AppError> {
    let mut builder = match settings.load_keypair_bytes(KEYPAIR_ENV_VAR)? {
        Some(bytes) => KeypairWallet::builder_from_bytes(&bytes)?,
        None => {
            warn!("No wallet keypair configured; using an ephemeral keypair");
            KeypairWallet::builder(Keypair::new())
        }
    };
    if let Some(label) = &settings.wallet_account_label {
        builder = builder.account_label(label.clone());
    }
    if let Some(uri) = &settings.wallet_uri_base {
        builder = builder.wallet_uri_base(uri.clone());
    }
    if let Some(rpc_url) = &settings.solana_rpc_url {
        info!("Submitting transactions through {}", rpc_url);
        builder = builder.rpc_url(rpc_url.clone());
    }
    Ok(builder.build())
}

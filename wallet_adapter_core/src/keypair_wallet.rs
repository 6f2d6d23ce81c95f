// In-process wallet transport backed by a Solana keypair
//
// Stands in for the wallet app: requests are checked up front the way the
// wallet library checks them, then answered from a worker thread so callers
// observe the same deferred behaviour as a real association.

use crate::deferred::{pending, Completer, PendingResult};
use crate::error::{AdapterError, AdapterResult};
use crate::models::{
    cluster, AuthorizationResult, RawSignedMessage, SignAndSendTransactionsResult,
    SignMessagesResult, SignPayloadsResult,
};
use crate::transport::WalletTransport;
use log::{debug, info, warn};
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use url::Url;

const DEFAULT_ACCOUNT_LABEL: &str = "Keypair wallet";
const DEFAULT_WALLET_URI_BASE: &str = "https://wallet.local";

pub struct KeypairWallet {
    inner: Arc<Inner>,
}

struct Inner {
    keypair: Keypair,
    account_label: String,
    wallet_uri_base: String,
    rpc: Option<RpcClient>,
    approval_delay: Duration,
    issued_tokens: Mutex<HashSet<String>>,
}

pub struct KeypairWalletBuilder {
    keypair: Keypair,
    account_label: String,
    wallet_uri_base: String,
    rpc_url: Option<String>,
    approval_delay: Duration,
}

impl KeypairWalletBuilder {
    pub fn account_label(mut self, label: impl Into<String>) -> Self {
        self.account_label = label.into();
        self
    }

    pub fn wallet_uri_base(mut self, uri: impl Into<String>) -> Self {
        self.wallet_uri_base = uri.into();
        self
    }

    /// Submit sign-and-send requests to this RPC endpoint. Without one the
    /// transactions are signed but not broadcast.
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    /// Pause before answering each request, like a user looking at a prompt.
    pub fn approval_delay(mut self, delay: Duration) -> Self {
        self.approval_delay = delay;
        self
    }

    pub fn build(self) -> KeypairWallet {
        KeypairWallet {
            inner: Arc::new(Inner {
                keypair: self.keypair,
                account_label: self.account_label,
                wallet_uri_base: self.wallet_uri_base,
                rpc: self.rpc_url.map(RpcClient::new),
                approval_delay: self.approval_delay,
                issued_tokens: Mutex::new(HashSet::new()),
            }),
        }
    }
}

impl KeypairWallet {
    pub fn builder(keypair: Keypair) -> KeypairWalletBuilder {
        KeypairWalletBuilder {
            keypair,
            account_label: DEFAULT_ACCOUNT_LABEL.to_string(),
            wallet_uri_base: DEFAULT_WALLET_URI_BASE.to_string(),
            rpc_url: None,
            approval_delay: Duration::ZERO,
        }
    }

    pub fn new(keypair: Keypair) -> Self {
        Self::builder(keypair).build()
    }

    /// Builder from raw keypair bytes (64-byte secret + public key).
    pub fn builder_from_bytes(bytes: &[u8]) -> AdapterResult<KeypairWalletBuilder> {
        let keypair =
            Keypair::try_from(bytes).map_err(|e| AdapterError::InvalidKeypair(e.to_string()))?;
        Ok(Self::builder(keypair))
    }

    pub fn public_key(&self) -> Vec<u8> {
        self.inner.keypair.pubkey().to_bytes().to_vec()
    }

    /// Run `work` on a worker thread and resolve the returned result with it.
    fn respond<T, F>(&self, op: &'static str, work: F) -> AdapterResult<PendingResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&Inner) -> AdapterResult<T> + Send + 'static,
    {
        let (completer, pending) = pending();
        let inner = self.inner.clone();
        thread::Builder::new()
            .name(format!("keypair-wallet-{}", op))
            .spawn(move || answer(&inner, completer, work))
            .map_err(|e| AdapterError::transport(format!("Failed to start wallet request: {}", e)))?;
        Ok(pending)
    }
}

fn answer<T, F>(inner: &Inner, completer: Completer<T>, work: F)
where
    F: FnOnce(&Inner) -> AdapterResult<T>,
{
    if !inner.approval_delay.is_zero() {
        thread::sleep(inner.approval_delay);
    }
    completer.complete(work(inner));
}

impl Inner {
    fn tokens(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.issued_tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn issue_token(&self) -> AuthorizationResult {
        let token = bs58::encode(rand::random::<[u8; 32]>()).into_string();
        self.tokens().insert(token.clone());
        AuthorizationResult {
            auth_token: token,
            public_key: self.keypair.pubkey().to_bytes().to_vec(),
            account_label: self.account_label.clone(),
            wallet_uri_base: self.wallet_uri_base.clone(),
        }
    }

    fn require_authorized(&self) -> AdapterResult<()> {
        if self.tokens().is_empty() {
            return Err(AdapterError::transport("Client is not authorized"));
        }
        Ok(())
    }

    fn sign_transaction(&self, bytes: &[u8]) -> AdapterResult<Transaction> {
        let mut tx: Transaction = bincode::deserialize(bytes)
            .map_err(|e| AdapterError::transport(format!("Invalid transaction payload: {}", e)))?;
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|e| AdapterError::transport(format!("Failed to sign transaction: {}", e)))?;
        Ok(tx)
    }

    fn send(&self, tx: &Transaction, min_context_slot: Option<u64>) -> AdapterResult<Signature> {
        match &self.rpc {
            Some(rpc) => {
                let config = RpcSendTransactionConfig {
                    min_context_slot,
                    ..RpcSendTransactionConfig::default()
                };
                rpc.send_transaction_with_config(tx, config)
                    .map_err(|e| AdapterError::Rpc(e.to_string()))
            }
            None => {
                warn!("No RPC endpoint configured, transaction signed but not sent");
                tx.signatures
                    .first()
                    .copied()
                    .ok_or_else(|| AdapterError::transport("Transaction has no signatures"))
            }
        }
    }
}

fn validate_identity(identity_uri: &str, icon_uri: &str) -> AdapterResult<()> {
    let identity = Url::parse(identity_uri)
        .map_err(|e| AdapterError::transport(format!("identityUri must be an absolute URI: {}", e)))?;
    if identity.cannot_be_a_base() {
        return Err(AdapterError::transport("identityUri must be a hierarchical URI"));
    }
    if !icon_uri.is_empty() && Url::parse(icon_uri).is_ok() {
        return Err(AdapterError::transport("iconRelativeUri must be a relative URI"));
    }
    Ok(())
}

impl WalletTransport for KeypairWallet {
    fn authorize(
        &self,
        identity_uri: &str,
        icon_uri: &str,
        identity_name: &str,
        cluster: &str,
    ) -> AdapterResult<PendingResult<AuthorizationResult>> {
        validate_identity(identity_uri, icon_uri)?;
        if !cluster::is_known(cluster) {
            return Err(AdapterError::transport(format!("Unknown cluster: {}", cluster)));
        }
        info!("Authorization requested by {} ({}) on {}", identity_name, identity_uri, cluster);
        self.respond("authorize", |inner| Ok(inner.issue_token()))
    }

    fn reauthorize(
        &self,
        identity_uri: &str,
        icon_uri: &str,
        identity_name: &str,
        auth_token: &str,
    ) -> AdapterResult<PendingResult<AuthorizationResult>> {
        validate_identity(identity_uri, icon_uri)?;
        debug!("Reauthorization requested by {}", identity_name);
        let auth_token = auth_token.to_string();
        self.respond("reauthorize", move |inner| {
            if !inner.tokens().remove(&auth_token) {
                return Err(AdapterError::transport("auth_token not valid for reauthorization"));
            }
            Ok(inner.issue_token())
        })
    }

    fn deauthorize(&self, auth_token: &str) -> AdapterResult<PendingResult<()>> {
        let auth_token = auth_token.to_string();
        self.respond("deauthorize", move |inner| {
            if !inner.tokens().remove(&auth_token) {
                return Err(AdapterError::transport("auth_token not valid for deauthorization"));
            }
            Ok(())
        })
    }

    fn sign_transactions(&self, transactions: &[Vec<u8>]) -> AdapterResult<PendingResult<SignPayloadsResult>> {
        let transactions = transactions.to_vec();
        self.respond("sign-transactions", move |inner| {
            inner.require_authorized()?;
            let signed_payloads = transactions
                .iter()
                .map(|bytes| {
                    let tx = inner.sign_transaction(bytes)?;
                    bincode::serialize(&tx).map_err(|e| {
                        AdapterError::transport(format!("Failed to serialize transaction: {}", e))
                    })
                })
                .collect::<AdapterResult<Vec<_>>>()?;
            Ok(SignPayloadsResult { signed_payloads })
        })
    }

    fn sign_and_send_transactions(
        &self,
        transactions: &[Vec<u8>],
        min_context_slot: Option<u64>,
    ) -> AdapterResult<PendingResult<SignAndSendTransactionsResult>> {
        let transactions = transactions.to_vec();
        self.respond("sign-and-send", move |inner| {
            inner.require_authorized()?;
            let signatures = transactions
                .iter()
                .map(|bytes| {
                    let tx = inner.sign_transaction(bytes)?;
                    let signature = inner.send(&tx, min_context_slot)?;
                    Ok(signature.as_ref().to_vec())
                })
                .collect::<AdapterResult<Vec<_>>>()?;
            Ok(SignAndSendTransactionsResult { signatures })
        })
    }

    fn sign_messages_detached(
        &self,
        messages: &[Vec<u8>],
        addresses: &[Vec<u8>],
    ) -> AdapterResult<PendingResult<SignMessagesResult>> {
        let messages = messages.to_vec();
        let addresses = addresses.to_vec();
        self.respond("sign-messages", move |inner| {
            inner.require_authorized()?;
            let own = inner.keypair.pubkey().to_bytes();
            if let Some(foreign) = addresses.iter().find(|a| a.as_slice() != own.as_slice()) {
                return Err(AdapterError::transport(format!(
                    "Address {} is not authorized for signing",
                    bs58::encode(foreign).into_string()
                )));
            }
            let messages = messages
                .into_iter()
                .map(|message| {
                    let signature = inner.keypair.sign_message(&message);
                    RawSignedMessage {
                        signatures: vec![signature.as_ref().to_vec(); addresses.len()],
                        addresses: addresses.clone(),
                        message,
                    }
                })
                .collect();
            Ok(SignMessagesResult { messages })
        })
    }
}

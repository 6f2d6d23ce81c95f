// Wallet transport abstraction
// Implementations exist for:
// - Native: an in-process keypair wallet (`keypair_wallet`)
// - Mobile hosts: a binding onto the platform wallet adapter library

use crate::deferred::PendingResult;
use crate::error::AdapterResult;
use crate::models::{
    AuthorizationResult, SignAndSendTransactionsResult, SignMessagesResult, SignPayloadsResult,
};

/// The wallet capability the client drives.
///
/// Each call either fails synchronously (the wallet rejected the request
/// outright) or returns a `PendingResult` that resolves once the wallet
/// answers. Calls may block briefly while the request is handed over but
/// must not wait for the wallet's answer.
pub trait WalletTransport: Send + Sync {
    fn authorize(
        &self,
        identity_uri: &str,
        icon_uri: &str,
        identity_name: &str,
        cluster: &str,
    ) -> AdapterResult<PendingResult<AuthorizationResult>>;

    fn reauthorize(
        &self,
        identity_uri: &str,
        icon_uri: &str,
        identity_name: &str,
        auth_token: &str,
    ) -> AdapterResult<PendingResult<AuthorizationResult>>;

    fn deauthorize(&self, auth_token: &str) -> AdapterResult<PendingResult<()>>;

    fn sign_transactions(&self, transactions: &[Vec<u8>]) -> AdapterResult<PendingResult<SignPayloadsResult>>;

    fn sign_and_send_transactions(
        &self,
        transactions: &[Vec<u8>],
        min_context_slot: Option<u64>,
    ) -> AdapterResult<PendingResult<SignAndSendTransactionsResult>>;

    fn sign_messages_detached(
        &self,
        messages: &[Vec<u8>],
        addresses: &[Vec<u8>],
    ) -> AdapterResult<PendingResult<SignMessagesResult>>;
}

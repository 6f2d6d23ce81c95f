// Public wallet adapter client
//
// Owns the session state and exposes the six wallet operations as
// callback-based calls. Each call runs synchronously until the transport hands
// back a pending result, then the async bridge waits for it on a background
// executor.

use crate::bridge::{AsyncBridge, BridgeLog};
use crate::deferred::PendingResult;
use crate::delegate::{Callback, ThreadRedirect};
use crate::dispatcher::Dispatcher;
use crate::error::{AdapterError, AdapterResult};
use crate::executor::{default_executor, BackgroundExecutor};
use crate::models::{raw_buffers, AuthorizationResult, ByteArray, SignedMessage};
use crate::session::{Session, SessionState};
use crate::transport::WalletTransport;
use log::error;
use std::sync::Arc;

pub const NO_MESSAGES_MESSAGE: &str = "Zero number of messages passed";
pub const NO_ADDRESSES_MESSAGE: &str = "Zero number of addresses passed";

pub struct WalletAdapterClient {
    transport: Option<Arc<dyn WalletTransport>>,
    bridge: AsyncBridge,
    session: Session,
    redirect: Option<ThreadRedirect>,
}

impl WalletAdapterClient {
    pub fn new(transport: Arc<dyn WalletTransport>) -> Self {
        Self {
            transport: Some(transport),
            bridge: AsyncBridge::new(default_executor()),
            session: Session::new(),
            redirect: None,
        }
    }

    /// A client on a platform without a wallet transport. Every operation
    /// fails with the unsupported-platform message.
    pub fn unsupported() -> Self {
        Self {
            transport: None,
            bridge: AsyncBridge::new(default_executor()),
            session: Session::new(),
            redirect: None,
        }
    }

    pub fn with_executor(mut self, executor: Arc<dyn BackgroundExecutor>) -> Self {
        self.bridge = AsyncBridge::new(executor);
        self
    }

    /// Deliver every callback of this client on `dispatcher`'s thread.
    pub fn with_callback_dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.redirect = Some(ThreadRedirect::new(dispatcher));
        self
    }

    pub fn session(&self) -> SessionState {
        self.session.snapshot()
    }

    pub fn auth_token(&self) -> String {
        self.session.auth_token()
    }

    pub fn public_key(&self) -> Vec<u8> {
        self.session.public_key()
    }

    pub fn account_label(&self) -> String {
        self.session.account_label()
    }

    pub fn wallet_uri_base(&self) -> String {
        self.session.wallet_uri_base()
    }

    pub fn is_authorized(&self) -> bool {
        self.session.is_authorized()
    }

    /// Authorize this app with the wallet. Success yields the auth token.
    pub fn authorize<S, F>(
        &self,
        identity_uri: &str,
        icon_uri: &str,
        identity_name: &str,
        cluster: &str,
        on_success: S,
        on_failure: F,
    ) where
        S: FnOnce(String) + Send + 'static,
        F: FnOnce(String) + Send + 'static,
    {
        let (on_success, on_failure) = self.callbacks(on_success, on_failure);
        let initiated =
            self.initiate(|t| t.authorize(identity_uri, icon_uri, identity_name, cluster));
        let session = self.session.clone();
        self.start(
            initiated,
            BridgeLog::new("Authorization failed", "Authorized successfully"),
            move |result: AuthorizationResult| {
                session.apply_authorization(&result);
                result.auth_token
            },
            on_success,
            on_failure,
        );
    }

    /// Refresh an existing authorization. Success yields the new auth token.
    pub fn reauthorize<S, F>(
        &self,
        identity_uri: &str,
        icon_uri: &str,
        identity_name: &str,
        auth_token: &str,
        on_success: S,
        on_failure: F,
    ) where
        S: FnOnce(String) + Send + 'static,
        F: FnOnce(String) + Send + 'static,
    {
        let (on_success, on_failure) = self.callbacks(on_success, on_failure);
        let initiated =
            self.initiate(|t| t.reauthorize(identity_uri, icon_uri, identity_name, auth_token));
        let session = self.session.clone();
        self.start(
            initiated,
            BridgeLog::new("Reauthorization failed", "Reauthorized successfully"),
            move |result: AuthorizationResult| {
                session.apply_authorization(&result);
                result.auth_token
            },
            on_success,
            on_failure,
        );
    }

    pub fn deauthorize<S, F>(&self, auth_token: &str, on_success: S, on_failure: F)
    where
        S: FnOnce(()) + Send + 'static,
        F: FnOnce(String) + Send + 'static,
    {
        let (on_success, on_failure) = self.callbacks(on_success, on_failure);
        let initiated = self.initiate(|t| t.deauthorize(auth_token));
        let session = self.session.clone();
        self.start(
            initiated,
            BridgeLog::new("Deauthorization failed", "Deauthorized successfully"),
            move |()| session.clear_auth_token(),
            on_success,
            on_failure,
        );
    }

    /// Sign transactions without submitting them. Signed payloads come back
    /// in input order.
    pub fn sign_transactions<S, F>(&self, transactions: &[ByteArray], on_success: S, on_failure: F)
    where
        S: FnOnce(Vec<ByteArray>) + Send + 'static,
        F: FnOnce(String) + Send + 'static,
    {
        let (on_success, on_failure) = self.callbacks(on_success, on_failure);
        let count = transactions.len();
        let raw = raw_buffers(transactions);
        let initiated = self.initiate(|t| t.sign_transactions(&raw));
        self.start(
            initiated,
            BridgeLog::new(
                format!("Failed to sign {} transaction(s)", count),
                format!("Signed {} transaction(s)", count),
            ),
            Vec::<ByteArray>::from,
            on_success,
            on_failure,
        );
    }

    /// Sign transactions and have the wallet submit them. Success yields one
    /// signature per transaction.
    pub fn sign_and_send_transactions<S, F>(
        &self,
        transactions: &[ByteArray],
        min_context_slot: Option<u64>,
        on_success: S,
        on_failure: F,
    ) where
        S: FnOnce(Vec<ByteArray>) + Send + 'static,
        F: FnOnce(String) + Send + 'static,
    {
        let (on_success, on_failure) = self.callbacks(on_success, on_failure);
        let count = transactions.len();
        let raw = raw_buffers(transactions);
        let initiated = self.initiate(|t| t.sign_and_send_transactions(&raw, min_context_slot));
        self.start(
            initiated,
            BridgeLog::new(
                format!("Failed to sign and send {} transaction(s)", count),
                format!("Signed and sent {} transaction(s)", count),
            ),
            Vec::<ByteArray>::from,
            on_success,
            on_failure,
        );
    }

    /// Produce detached signatures over `messages` by each of `addresses`.
    /// Empty inputs fail before the wallet is contacted.
    pub fn sign_messages_detached<S, F>(
        &self,
        messages: &[ByteArray],
        addresses: &[ByteArray],
        on_success: S,
        on_failure: F,
    ) where
        S: FnOnce(Vec<SignedMessage>) + Send + 'static,
        F: FnOnce(String) + Send + 'static,
    {
        let (on_success, on_failure) = self.callbacks(on_success, on_failure);
        if messages.is_empty() {
            on_failure(NO_MESSAGES_MESSAGE.to_string());
            return;
        }
        if addresses.is_empty() {
            on_failure(NO_ADDRESSES_MESSAGE.to_string());
            return;
        }

        let count = messages.len();
        let raw_messages = raw_buffers(messages);
        let raw_addresses = raw_buffers(addresses);
        let initiated = self.initiate(|t| t.sign_messages_detached(&raw_messages, &raw_addresses));
        self.start(
            initiated,
            BridgeLog::new(
                format!("Failed to sign {} message(s)", count),
                format!("Signed {} message(s)", count),
            ),
            Vec::<SignedMessage>::from,
            on_success,
            on_failure,
        );
    }

    fn callbacks<T, S, F>(&self, on_success: S, on_failure: F) -> (Callback<T>, Callback<String>)
    where
        T: Send + 'static,
        S: FnOnce(T) + Send + 'static,
        F: FnOnce(String) + Send + 'static,
    {
        match &self.redirect {
            Some(redirect) => (redirect.wrap(on_success), redirect.wrap(on_failure)),
            None => (Box::new(on_success), Box::new(on_failure)),
        }
    }

    fn initiate<R>(
        &self,
        call: impl FnOnce(&dyn WalletTransport) -> AdapterResult<PendingResult<R>>,
    ) -> AdapterResult<PendingResult<R>> {
        match &self.transport {
            Some(transport) => call(transport.as_ref()),
            None => Err(AdapterError::UnsupportedPlatform),
        }
    }

    fn start<R, T, C>(
        &self,
        initiated: AdapterResult<PendingResult<R>>,
        log: BridgeLog,
        convert: C,
        on_success: Callback<T>,
        on_failure: Callback<String>,
    ) where
        R: Send + 'static,
        T: Send + 'static,
        C: FnOnce(R) -> T + Send + 'static,
    {
        match initiated {
            Ok(pending) => self.bridge.spawn(pending, log, convert, on_success, on_failure),
            Err(AdapterError::UnsupportedPlatform) => {
                on_failure(AdapterError::UnsupportedPlatform.to_string())
            }
            Err(e) => {
                let message = e.to_string();
                error!("{}: {}", log.failure_context, message);
                on_failure(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred::{pending, Completer};
    use crate::dispatcher::MainQueue;
    use crate::executor::{Task, ThreadExecutor};
    use crate::models::{
        Outcome, RawSignedMessage, SignAndSendTransactionsResult, SignMessagesResult,
        SignPayloadsResult,
    };
    use crate::outcome::outcome_channel;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Transport double: counts calls, can fail synchronously, and either
    /// answers at once or parks the completer for the test to resolve.
    #[derive(Default)]
    struct MockTransport {
        calls: AtomicUsize,
        sync_error: Mutex<Option<String>>,
        async_error: Mutex<Option<String>>,
        hold: Mutex<bool>,
        held_auth: Mutex<Option<Completer<AuthorizationResult>>>,
        next_token: Mutex<String>,
        last_min_context_slot: Mutex<Option<u64>>,
    }

    impl MockTransport {
        fn answering(token: &str) -> Arc<Self> {
            let mock = Self::default();
            *mock.next_token.lock().unwrap() = token.to_string();
            Arc::new(mock)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn reply<T: Send + 'static>(&self, value: T) -> AdapterResult<PendingResult<T>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = self.sync_error.lock().unwrap().clone() {
                return Err(AdapterError::Transport(message));
            }
            match self.async_error.lock().unwrap().clone() {
                Some(message) => Ok(PendingResult::ready(Err(AdapterError::Transport(message)))),
                None => Ok(PendingResult::ready(Ok(value))),
            }
        }

        fn auth_result(&self) -> AuthorizationResult {
            AuthorizationResult {
                auth_token: self.next_token.lock().unwrap().clone(),
                public_key: vec![3; 32],
                account_label: "Savings".to_string(),
                wallet_uri_base: "https://wallet.example".to_string(),
            }
        }
    }

    impl WalletTransport for MockTransport {
        fn authorize(&self, _: &str, _: &str, _: &str, _: &str) -> AdapterResult<PendingResult<AuthorizationResult>> {
            if *self.hold.lock().unwrap() {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let (completer, pending) = pending();
                *self.held_auth.lock().unwrap() = Some(completer);
                return Ok(pending);
            }
            self.reply(self.auth_result())
        }

        fn reauthorize(&self, _: &str, _: &str, _: &str, _: &str) -> AdapterResult<PendingResult<AuthorizationResult>> {
            self.reply(self.auth_result())
        }

        fn deauthorize(&self, _: &str) -> AdapterResult<PendingResult<()>> {
            self.reply(())
        }

        fn sign_transactions(&self, transactions: &[Vec<u8>]) -> AdapterResult<PendingResult<SignPayloadsResult>> {
            let signed_payloads = transactions
                .iter()
                .map(|tx| {
                    let mut signed = tx.clone();
                    signed.push(0xff);
                    signed
                })
                .collect();
            self.reply(SignPayloadsResult { signed_payloads })
        }

        fn sign_and_send_transactions(
            &self,
            transactions: &[Vec<u8>],
            min_context_slot: Option<u64>,
        ) -> AdapterResult<PendingResult<SignAndSendTransactionsResult>> {
            *self.last_min_context_slot.lock().unwrap() = min_context_slot;
            let signatures = transactions.iter().map(|tx| vec![tx[0]; 64]).collect();
            self.reply(SignAndSendTransactionsResult { signatures })
        }

        fn sign_messages_detached(
            &self,
            messages: &[Vec<u8>],
            addresses: &[Vec<u8>],
        ) -> AdapterResult<PendingResult<SignMessagesResult>> {
            let messages = messages
                .iter()
                .map(|m| RawSignedMessage {
                    message: m.clone(),
                    signatures: addresses.iter().map(|a| vec![a[0]; 64]).collect(),
                    addresses: addresses.to_vec(),
                })
                .collect();
            self.reply(SignMessagesResult { messages })
        }
    }

    struct CountingExecutor {
        inner: ThreadExecutor,
        spawned: AtomicUsize,
    }

    impl CountingExecutor {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: ThreadExecutor::new("client-test"),
                spawned: AtomicUsize::new(0),
            })
        }

        fn spawned(&self) -> usize {
            self.spawned.load(Ordering::SeqCst)
        }
    }

    impl BackgroundExecutor for CountingExecutor {
        fn execute(&self, task: Task) {
            self.spawned.fetch_add(1, Ordering::SeqCst);
            self.inner.execute(task);
        }
    }

    fn client(transport: Arc<MockTransport>, executor: Arc<CountingExecutor>) -> WalletAdapterClient {
        WalletAdapterClient::new(transport).with_executor(executor)
    }

    fn bytes(values: &[&[u8]]) -> Vec<ByteArray> {
        values.iter().map(|v| ByteArray::from(*v)).collect()
    }

    #[test]
    fn empty_messages_fail_synchronously_without_transport_call() {
        let transport = MockTransport::answering("t");
        let executor = CountingExecutor::new();
        let client = client(transport.clone(), executor.clone());
        let (on_success, on_failure, mut rx) = outcome_channel();

        client.sign_messages_detached(&[], &bytes(&[&[1; 32]]), on_success, on_failure);

        assert_eq!(rx.try_take(), Some(Outcome::Failure("Zero number of messages passed".to_string())));
        assert_eq!(transport.calls(), 0);
        assert_eq!(executor.spawned(), 0);
    }

    #[test]
    fn empty_addresses_fail_synchronously_without_transport_call() {
        let transport = MockTransport::answering("t");
        let client = client(transport.clone(), CountingExecutor::new());
        let (on_success, on_failure, mut rx) = outcome_channel();

        client.sign_messages_detached(&bytes(&[b"hello"]), &[], on_success, on_failure);

        assert_eq!(rx.try_take(), Some(Outcome::Failure("Zero number of addresses passed".to_string())));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn validation_precedes_platform_check() {
        let client = WalletAdapterClient::unsupported();
        let (on_success, on_failure, mut rx) = outcome_channel();
        client.sign_messages_detached(&[], &[], on_success, on_failure);
        assert_eq!(rx.try_take(), Some(Outcome::Failure(NO_MESSAGES_MESSAGE.to_string())));
    }

    #[test]
    fn unsupported_platform_fails_synchronously() {
        let client = WalletAdapterClient::unsupported();
        let (on_success, on_failure, mut rx) = outcome_channel();
        client.authorize("https://app.example", "favicon.ico", "App", "devnet", on_success, on_failure);
        assert_eq!(
            rx.try_take(),
            Some(Outcome::Failure("Current platform is not supported".to_string()))
        );
    }

    #[test]
    fn synchronous_transport_error_skips_background_work() {
        let transport = MockTransport::answering("t");
        *transport.sync_error.lock().unwrap() = Some("Wallet not installed".to_string());
        let executor = CountingExecutor::new();
        let client = client(transport.clone(), executor.clone());
        let (on_success, on_failure, mut rx) = outcome_channel();

        client.authorize("https://app.example", "favicon.ico", "App", "devnet", on_success, on_failure);

        assert_eq!(rx.try_take(), Some(Outcome::Failure("Wallet not installed".to_string())));
        assert_eq!(transport.calls(), 1);
        assert_eq!(executor.spawned(), 0);
        assert!(!client.is_authorized());
    }

    #[test]
    fn authorize_updates_session_before_success_callback() {
        let transport = MockTransport::answering("token-1");
        let executor = CountingExecutor::new();
        let client = client(transport, executor.clone());
        let session = client.session.clone();
        let (tx, rx) = std::sync::mpsc::channel();

        client.authorize(
            "https://app.example",
            "favicon.ico",
            "App",
            "devnet",
            move |token| {
                let _ = tx.send((token, session.snapshot()));
            },
            |message| panic!("unexpected failure: {}", message),
        );

        let (token, seen) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(token, "token-1");
        assert_eq!(seen.auth_token, "token-1");
        assert_eq!(seen.public_key, vec![3; 32]);
        assert_eq!(seen.account_label, "Savings");
        assert_eq!(seen.wallet_uri_base, "https://wallet.example");
        assert_eq!(executor.spawned(), 1);
    }

    #[test]
    fn failed_reauthorize_leaves_session_untouched() {
        let transport = MockTransport::answering("token-1");
        let client = client(transport.clone(), CountingExecutor::new());
        let (on_success, on_failure, rx) = outcome_channel();
        client.authorize("https://app.example", "favicon.ico", "App", "devnet", on_success, on_failure);
        assert!(rx.wait().is_success());
        let before = client.session();

        *transport.async_error.lock().unwrap() = Some("auth token not valid for reauthorization".to_string());
        let (on_success, on_failure, rx) = outcome_channel();
        client.reauthorize("https://app.example", "favicon.ico", "App", "token-1", on_success, on_failure);

        assert_eq!(
            rx.wait(),
            Outcome::Failure("auth token not valid for reauthorization".to_string())
        );
        assert_eq!(client.session(), before);
    }

    #[test]
    fn reauthorize_replaces_token() {
        let transport = MockTransport::answering("token-1");
        let client = client(transport.clone(), CountingExecutor::new());
        let (on_success, on_failure, rx) = outcome_channel();
        client.authorize("https://app.example", "favicon.ico", "App", "devnet", on_success, on_failure);
        rx.wait();

        *transport.next_token.lock().unwrap() = "token-2".to_string();
        let (on_success, on_failure, rx) = outcome_channel();
        client.reauthorize("https://app.example", "favicon.ico", "App", "token-1", on_success, on_failure);

        assert_eq!(rx.wait(), Outcome::Success("token-2".to_string()));
        assert_eq!(client.auth_token(), "token-2");
    }

    #[test]
    fn deauthorize_clears_only_the_token() {
        let transport = MockTransport::answering("token-1");
        let client = client(transport, CountingExecutor::new());
        let (on_success, on_failure, rx) = outcome_channel();
        client.authorize("https://app.example", "favicon.ico", "App", "devnet", on_success, on_failure);
        rx.wait();

        let (on_success, on_failure, rx) = outcome_channel();
        client.deauthorize("token-1", on_success, on_failure);

        assert_eq!(rx.wait(), Outcome::Success(()));
        assert!(!client.is_authorized());
        assert_eq!(client.public_key(), vec![3; 32]);
        assert_eq!(client.account_label(), "Savings");
    }

    #[test]
    fn failed_deauthorize_keeps_token() {
        let transport = MockTransport::answering("token-1");
        let client = client(transport.clone(), CountingExecutor::new());
        let (on_success, on_failure, rx) = outcome_channel();
        client.authorize("https://app.example", "favicon.ico", "App", "devnet", on_success, on_failure);
        rx.wait();

        *transport.async_error.lock().unwrap() = Some("session terminated".to_string());
        let (on_success, on_failure, rx) = outcome_channel();
        client.deauthorize("token-1", on_success, on_failure);

        assert_eq!(rx.wait(), Outcome::Failure("session terminated".to_string()));
        assert_eq!(client.auth_token(), "token-1");
    }

    #[test]
    fn sign_transactions_preserves_order() {
        let client = client(MockTransport::answering("t"), CountingExecutor::new());
        let (on_success, on_failure, rx) = outcome_channel();

        client.sign_transactions(&bytes(&[&[1, 1], &[2, 2]]), on_success, on_failure);

        assert_eq!(
            rx.wait(),
            Outcome::Success(bytes(&[&[1, 1, 0xff], &[2, 2, 0xff]]))
        );
    }

    #[test]
    fn sign_and_send_passes_min_context_slot() {
        let transport = MockTransport::answering("t");
        let client = client(transport.clone(), CountingExecutor::new());
        let (on_success, on_failure, rx) = outcome_channel();

        client.sign_and_send_transactions(&bytes(&[&[5], &[6]]), Some(1234), on_success, on_failure);

        let signatures = rx.wait().into_result().unwrap();
        assert_eq!(signatures.len(), 2);
        assert_eq!(signatures[1].as_slice(), &[6u8; 64][..]);
        assert_eq!(*transport.last_min_context_slot.lock().unwrap(), Some(1234));
    }

    #[test]
    fn sign_messages_returns_positional_signatures() {
        let client = client(MockTransport::answering("t"), CountingExecutor::new());
        let (on_success, on_failure, rx) = outcome_channel();

        client.sign_messages_detached(
            &bytes(&[b"one", b"two"]),
            &bytes(&[&[4; 32], &[5; 32]]),
            on_success,
            on_failure,
        );

        let signed = rx.wait().into_result().unwrap();
        assert_eq!(signed.len(), 2);
        assert_eq!(signed[1].message().as_slice(), b"two");
        assert_eq!(signed[1].signatures()[1].as_slice(), &[5u8; 64][..]);
        assert_eq!(signed[1].addresses()[0].as_slice(), &[4u8; 32][..]);
    }

    #[test]
    fn redirected_callbacks_land_on_designated_thread() {
        let transport = MockTransport::answering("token-1");
        *transport.hold.lock().unwrap() = true;
        let (handle, runner) = MainQueue::bind_current_thread();
        let main_id = std::thread::current().id();
        let client = client(transport.clone(), CountingExecutor::new())
            .with_callback_dispatcher(Arc::new(handle));
        let (tx, rx) = std::sync::mpsc::channel();

        client.authorize(
            "https://app.example",
            "favicon.ico",
            "App",
            "devnet",
            move |token| {
                let _ = tx.send((token, std::thread::current().id()));
            },
            |message| panic!("unexpected failure: {}", message),
        );

        // The call returned while the wallet is still deciding.
        assert!(rx.try_recv().is_err());
        let completer = transport.held_auth.lock().unwrap().take().unwrap();
        completer.resolve(transport.auth_result());

        let mut delivered = None;
        let reached = runner.run_until(
            || {
                if delivered.is_none() {
                    delivered = rx.try_recv().ok();
                }
                delivered.is_some()
            },
            Duration::from_secs(5),
        );
        assert!(reached);
        let (token, ran_on) = delivered.unwrap();
        assert_eq!(token, "token-1");
        assert_eq!(ran_on, main_id);
    }

    #[test]
    fn redirected_fast_fail_runs_in_place_on_designated_thread() {
        let (handle, runner) = MainQueue::bind_current_thread();
        let client = WalletAdapterClient::unsupported().with_callback_dispatcher(Arc::new(handle));
        let (on_success, on_failure, mut rx) = outcome_channel::<Vec<SignedMessage>>();

        client.sign_messages_detached(&bytes(&[b"m"]), &[], on_success, on_failure);

        assert_eq!(rx.try_take(), Some(Outcome::Failure(NO_ADDRESSES_MESSAGE.to_string())));
        assert_eq!(runner.run_pending(), 0);
    }
}

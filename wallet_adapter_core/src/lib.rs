// Wallet Adapter Core Library
// Callback-style wallet client over an asynchronous wallet transport

pub mod error;
pub mod models;
pub mod deferred;
pub mod executor;
pub mod dispatcher;
pub mod delegate;
pub mod bridge;
pub mod transport;
pub mod session;
pub mod outcome;
pub mod client;
pub mod settings;

#[cfg(feature = "native")]
pub mod keypair_wallet;

// Re-exports
pub use error::{AdapterError, AdapterResult, UNSUPPORTED_PLATFORM_MESSAGE};
pub use models::*;
pub use deferred::{pending, Completer, PendingResult};
pub use executor::{default_executor, BackgroundExecutor, ThreadExecutor, TokioExecutor};
pub use dispatcher::{DispatchThread, Dispatcher, MainQueue, MainQueueHandle, MainQueueRunner};
pub use delegate::{Callback, ThreadRedirect};
pub use transport::WalletTransport;
pub use session::{Session, SessionState};
pub use outcome::{outcome_channel, OutcomeReceiver};
pub use client::WalletAdapterClient;
pub use settings::Settings;

#[cfg(feature = "native")]
pub use keypair_wallet::{KeypairWallet, KeypairWalletBuilder};

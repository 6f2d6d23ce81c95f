use thiserror::Error;
use wallet_adapter_core::AdapterError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Initialization error: {0}")]
    Init(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Wallet error: {0}")]
    Wallet(String),
    #[error("Timed out after {0}s waiting for the wallet")]
    Timeout(u64),
}

use thiserror::Error;

/// Message reported whenever no wallet transport exists on this platform.
pub const UNSUPPORTED_PLATFORM_MESSAGE: &str = "Current platform is not supported";

/// Errors surfaced by the wallet adapter.
///
/// Callback-facing variants (`Validation`, `Transport`) display the bare
/// message so that failure callbacks receive exactly what the wallet reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Transport(String),

    #[error("{}", UNSUPPORTED_PLATFORM_MESSAGE)]
    UnsupportedPlatform,

    #[error("Wallet session closed before a result was produced")]
    SessionClosed,

    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),

    #[cfg(feature = "native")]
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("TOML serialization error: {0}")]
    TomlSerialization(String),

    #[error("RPC error: {0}")]
    Rpc(String),
}

pub type AdapterResult<T> = Result<T, AdapterError>;

impl AdapterError {
    pub fn transport<T: std::fmt::Display>(inner: T) -> Self {
        Self::Transport(inner.to_string())
    }
}

impl From<std::io::Error> for AdapterError {
    fn from(err: std::io::Error) -> Self {
        AdapterError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Json(err.to_string())
    }
}

#[cfg(feature = "native")]
impl From<config::ConfigError> for AdapterError {
    fn from(err: config::ConfigError) -> Self {
        AdapterError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AdapterError {
    fn from(err: toml::ser::Error) -> Self {
        AdapterError::TomlSerialization(err.to_string())
    }
}

use crate::error::AdapterError;
use crate::models::cluster;
use serde::{Deserialize, Serialize};

#[cfg(feature = "native")]
use base64::{engine::general_purpose::STANDARD as Base64Engine, Engine};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Absolute URI identifying the requesting app to the wallet.
    pub identity_uri: String,
    /// Icon path relative to `identity_uri`.
    #[serde(default = "default_icon_uri")]
    pub icon_uri: String,
    pub identity_name: String,
    #[serde(default = "default_cluster")]
    pub cluster: String,
    #[serde(default)]
    pub wallet_keypair_path: Option<String>,
    #[serde(default)]
    pub wallet_keypair_json: Option<String>,
    #[serde(default)]
    pub wallet_private_key_string: Option<String>,
    #[serde(default)]
    pub wallet_account_label: Option<String>,
    #[serde(default)]
    pub wallet_uri_base: Option<String>,
    #[serde(default)]
    pub solana_rpc_url: Option<String>,
    #[serde(default = "default_background_threads")]
    pub background_threads: usize,
    #[serde(default = "default_callback_timeout_secs")]
    pub callback_timeout_secs: u64,
}

impl Settings {
    #[cfg(feature = "native")]
    pub fn from_file(path: &str) -> Result<Self, AdapterError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("WALLET_ADAPTER").try_parsing(true));
        let cfg = builder.build()?;
        Ok(cfg.try_deserialize()?)
    }

    #[cfg(feature = "native")]
    pub fn save_to_file(&self, path: &str) -> Result<(), AdapterError> {
        let toml_string = toml::to_string(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// Validate settings ranges and constraints
    pub fn validate(&self) -> Result<(), AdapterError> {
        let identity = url::Url::parse(&self.identity_uri).map_err(|e| {
            AdapterError::Validation(format!("identity_uri must be an absolute URI: {}", e))
        })?;
        if identity.cannot_be_a_base() {
            return Err(AdapterError::Validation("identity_uri must be hierarchical".to_string()));
        }
        if url::Url::parse(&self.icon_uri).is_ok() {
            return Err(AdapterError::Validation("icon_uri must be relative".to_string()));
        }
        if self.identity_name.trim().is_empty() {
            return Err(AdapterError::Validation("identity_name must not be empty".to_string()));
        }
        if !cluster::is_known(&self.cluster) {
            return Err(AdapterError::Validation(format!(
                "cluster must be one of {:?}",
                cluster::ALL
            )));
        }
        if self.background_threads == 0 {
            return Err(AdapterError::Validation("background_threads must be > 0".to_string()));
        }
        if self.callback_timeout_secs == 0 {
            return Err(AdapterError::Validation("callback_timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    /// Resolve the wallet keypair bytes from, in order: the base64 env var,
    /// the private key string, the inline JSON array, the keypair file.
    #[cfg(feature = "native")]
    pub fn load_keypair_bytes(&self, env_var: &str) -> Result<Option<Vec<u8>>, AdapterError> {
        if let Some(bytes) = load_keypair_from_env_var(env_var) {
            return Ok(Some(bytes));
        }
        if let Some(pk_string) = &self.wallet_private_key_string {
            return parse_private_key_string(pk_string)
                .map(Some)
                .map_err(AdapterError::InvalidKeypair);
        }
        if let Some(json) = &self.wallet_keypair_json {
            let bytes: Vec<u8> = serde_json::from_str(json)?;
            return Ok(Some(bytes));
        }
        if let Some(path) = &self.wallet_keypair_path {
            // solana-keygen files hold a JSON byte array
            let contents = std::fs::read_to_string(path)?;
            let bytes: Vec<u8> = serde_json::from_str(contents.trim())?;
            return Ok(Some(bytes));
        }
        Ok(None)
    }
}

/// Try to read a base64-encoded keypair from the given env var. Returns
/// the raw decoded bytes if present and valid, otherwise None.
#[cfg(feature = "native")]
pub fn load_keypair_from_env_var(var: &str) -> Option<Vec<u8>> {
    if let Ok(s) = std::env::var(var) {
        match Base64Engine.decode(&s) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Failed to decode {}: {}", var, e);
                None
            }
        }
    } else {
        None
    }
}

/// Parse a private key string in various formats:
/// - Base58 (standard Solana format, 88 chars)
/// - JSON array string like "[1,2,3,...]"
/// - Comma-separated bytes like "1,2,3,..."
pub fn parse_private_key_string(s: &str) -> Result<Vec<u8>, String> {
    let trimmed = s.trim();

    if trimmed.len() >= 80 && !trimmed.starts_with('[') && !trimmed.contains(',') {
        return bs58::decode(trimmed)
            .into_vec()
            .map_err(|e| format!("Base58 decode failed: {}", e));
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str::<Vec<u8>>(trimmed)
            .map_err(|e| format!("JSON parse failed: {}", e));
    }

    if trimmed.contains(',') {
        let parts: Result<Vec<u8>, _> = trimmed
            .split(',')
            .map(|s| s.trim().parse::<u8>())
            .collect();
        return parts.map_err(|e| format!("CSV parse failed: {}", e));
    }

    Err("Unrecognized private key format. Expected: base58, JSON array, or comma-separated bytes".to_string())
}

fn default_icon_uri() -> String { "favicon.ico".to_string() }
fn default_cluster() -> String { cluster::DEVNET.to_string() }
fn default_background_threads() -> usize { 2 }
fn default_callback_timeout_secs() -> u64 { 120 }

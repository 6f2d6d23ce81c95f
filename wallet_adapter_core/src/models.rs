use crate::error::AdapterError;
use serde::{Deserialize, Serialize};

/// Cluster identifiers understood by wallets during authorization.
pub mod cluster {
    pub const MAINNET_BETA: &str = "mainnet-beta";
    pub const TESTNET: &str = "testnet";
    pub const DEVNET: &str = "devnet";

    pub const ALL: [&str; 3] = [MAINNET_BETA, TESTNET, DEVNET];

    pub fn is_known(cluster: &str) -> bool {
        ALL.contains(&cluster)
    }
}

/// Immutable byte buffer: a transaction, message, address or signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ByteArray(Vec<u8>);

impl ByteArray {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Base58 rendering, the usual form for addresses and signatures.
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }
}

impl From<Vec<u8>> for ByteArray {
    fn from(data: Vec<u8>) -> Self {
        Self(data)
    }
}

impl From<&[u8]> for ByteArray {
    fn from(data: &[u8]) -> Self {
        Self(data.to_vec())
    }
}

impl AsRef<[u8]> for ByteArray {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A message together with the detached signatures a wallet produced for it.
/// `signatures[i]` was made by `addresses[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    message: ByteArray,
    signatures: Vec<ByteArray>,
    addresses: Vec<ByteArray>,
}

impl SignedMessage {
    pub fn new(message: ByteArray, signatures: Vec<ByteArray>, addresses: Vec<ByteArray>) -> Self {
        Self {
            message,
            signatures,
            addresses,
        }
    }

    pub fn message(&self) -> &ByteArray {
        &self.message
    }

    pub fn signatures(&self) -> &[ByteArray] {
        &self.signatures
    }

    pub fn addresses(&self) -> &[ByteArray] {
        &self.addresses
    }
}

/// Raw authorization response as reported by the wallet transport.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthorizationResult {
    pub auth_token: String,
    pub public_key: Vec<u8>,
    pub account_label: String,
    pub wallet_uri_base: String,
}

/// Raw response of a sign-transactions request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignPayloadsResult {
    pub signed_payloads: Vec<Vec<u8>>,
}

/// Raw response of a sign-and-send request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignAndSendTransactionsResult {
    pub signatures: Vec<Vec<u8>>,
}

/// Raw response of a sign-messages request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignMessagesResult {
    pub messages: Vec<RawSignedMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawSignedMessage {
    pub message: Vec<u8>,
    pub signatures: Vec<Vec<u8>>,
    pub addresses: Vec<Vec<u8>>,
}

impl From<SignPayloadsResult> for Vec<ByteArray> {
    fn from(result: SignPayloadsResult) -> Self {
        result.signed_payloads.into_iter().map(ByteArray::from).collect()
    }
}

impl From<SignAndSendTransactionsResult> for Vec<ByteArray> {
    fn from(result: SignAndSendTransactionsResult) -> Self {
        result.signatures.into_iter().map(ByteArray::from).collect()
    }
}

impl From<RawSignedMessage> for SignedMessage {
    fn from(raw: RawSignedMessage) -> Self {
        SignedMessage::new(
            raw.message.into(),
            raw.signatures.into_iter().map(ByteArray::from).collect(),
            raw.addresses.into_iter().map(ByteArray::from).collect(),
        )
    }
}

impl From<SignMessagesResult> for Vec<SignedMessage> {
    fn from(result: SignMessagesResult) -> Self {
        result.messages.into_iter().map(SignedMessage::from).collect()
    }
}

/// Terminal result of any adapter operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome<T> {
    Success(T),
    Failure(String),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(message) => Err(message),
        }
    }
}

impl<T> From<Result<T, AdapterError>> for Outcome<T> {
    fn from(result: Result<T, AdapterError>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(e) => Outcome::Failure(e.to_string()),
        }
    }
}

pub(crate) fn raw_buffers(buffers: &[ByteArray]) -> Vec<Vec<u8>> {
    buffers.iter().map(|b| b.as_slice().to_vec()).collect()
}

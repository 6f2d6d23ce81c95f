use crate::models::AuthorizationResult;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Authorization state held by a client. An empty auth token means the
/// client is unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub auth_token: String,
    pub public_key: Vec<u8>,
    pub account_label: String,
    pub wallet_uri_base: String,
}

impl SessionState {
    pub fn is_authorized(&self) -> bool {
        !self.auth_token.is_empty()
    }
}

/// Shared handle to a client's session state.
///
/// Writers replace all fields under one write lock, so readers never see a
/// half-applied authorization. Concurrent completions are last-write-wins.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: Arc<RwLock<SessionState>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SessionState {
        self.read().clone()
    }

    pub fn auth_token(&self) -> String {
        self.read().auth_token.clone()
    }

    pub fn public_key(&self) -> Vec<u8> {
        self.read().public_key.clone()
    }

    pub fn account_label(&self) -> String {
        self.read().account_label.clone()
    }

    pub fn wallet_uri_base(&self) -> String {
        self.read().wallet_uri_base.clone()
    }

    pub fn is_authorized(&self) -> bool {
        self.read().is_authorized()
    }

    pub(crate) fn apply_authorization(&self, result: &AuthorizationResult) {
        *self.write() = SessionState {
            auth_token: result.auth_token.clone(),
            public_key: result.public_key.clone(),
            account_label: result.account_label.clone(),
            wallet_uri_base: result.wallet_uri_base.clone(),
        };
    }

    /// Deauthorization only forgets the token; the other fields keep their
    /// last values.
    pub(crate) fn clear_auth_token(&self) {
        self.write().auth_token.clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

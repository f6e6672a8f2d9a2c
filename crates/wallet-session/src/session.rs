//! WalletSession: the single mutable session record and its read-only snapshot.

use serde::{Deserialize, Serialize};
use wallet_types::{format_display, lamports_to_display, Address, AuthToken};

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// Account and credential held while connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub address: Address,
    pub label: Option<String>,
    pub auth_token: AuthToken,
}

/// Session record. Credentials are only ever present together with
/// `SessionStatus::Connected`; every transition goes through a method here.
#[derive(Debug, Clone, Default)]
pub struct WalletSession {
    status: SessionStatus,
    credentials: Option<SessionCredentials>,
    balance_lamports: Option<u64>,
    last_error: Option<SessionError>,
}

impl WalletSession {
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn address(&self) -> Option<&Address> {
        self.credentials.as_ref().map(|c| &c.address)
    }

    pub fn auth_token(&self) -> Option<&AuthToken> {
        self.credentials.as_ref().map(|c| &c.auth_token)
    }

    pub fn account_label(&self) -> Option<&str> {
        self.credentials.as_ref().and_then(|c| c.label.as_deref())
    }

    pub fn balance_lamports(&self) -> Option<u64> {
        self.balance_lamports
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    /// `address`, `auth_token` and `Connected` status appear together or not at all.
    pub fn holds_invariant(&self) -> bool {
        let connected = self.status == SessionStatus::Connected;
        self.address().is_some() == connected && self.auth_token().is_some() == connected
    }

    pub(crate) fn begin_connecting(&mut self) {
        self.status = SessionStatus::Connecting;
        self.credentials = None;
        self.balance_lamports = None;
    }

    pub(crate) fn mark_connected(&mut self, credentials: SessionCredentials) {
        self.status = SessionStatus::Connected;
        self.credentials = Some(credentials);
        self.balance_lamports = None;
    }

    /// Moves the credentials out so the caller can deauthorize with them.
    pub(crate) fn begin_disconnecting(&mut self) -> Option<SessionCredentials> {
        if self.status != SessionStatus::Connected {
            return None;
        }
        self.status = SessionStatus::Disconnecting;
        self.balance_lamports = None;
        self.credentials.take()
    }

    pub(crate) fn fail_connect(&mut self, error: SessionError) {
        self.reset();
        self.last_error = Some(error);
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn set_balance(&mut self, lamports: u64) {
        self.balance_lamports = Some(lamports);
    }

    pub(crate) fn record_error(&mut self, error: SessionError) {
        self.last_error = Some(error);
    }

    pub(crate) fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            address: self.address().cloned(),
            account_label: self.account_label().map(str::to_string),
            balance_lamports: self.balance_lamports,
            balance_display: self.balance_lamports.map(lamports_to_display),
            balance_text: self.balance_lamports.map(format_display),
            last_error: self.last_error.as_ref().map(ToString::to_string),
        }
    }
}

/// Read-only view handed to presentation code.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub address: Option<Address>,
    pub account_label: Option<String>,
    pub balance_lamports: Option<u64>,
    /// Approximate; `balance_text` is exact.
    pub balance_display: Option<f64>,
    pub balance_text: Option<String>,
    pub last_error: Option<String>,
}

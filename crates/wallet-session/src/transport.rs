use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use wallet_sim::{SimRejection, SimulatedWallet};
use wallet_types::{
    Address, AppIdentity, AuthToken, AuthorizationResult, Cluster, Signature, SignedTransaction,
    Transaction,
};

use crate::ledger::{SharedLedger, SimulatedLedgerClient};

/// Wallet-side code for a request the user declined.
pub const USER_DECLINED: i32 = 4001;
/// Wallet-side code for a request made without a live authorization.
pub const NOT_AUTHORIZED: i32 = 4100;
/// Ledger refused to accept a signed transaction.
pub const SUBMISSION_REJECTED: i32 = -32002;

/// Error model for wallet transport operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("wallet request timed out")]
    Timeout,
    #[error("wallet unavailable: {0}")]
    Unavailable(String),
    #[error("request rejected: code={code}, message={message}")]
    Rejected { code: i32, message: String },
    #[error("auth token is invalid or expired")]
    InvalidToken,
    #[error("internal transport error: {0}")]
    Internal(String),
}

/// Signing authority interface. Implementations may talk to a real wallet app
/// or, as in [`SimulatedTransport`], to an in-memory stand-in.
#[async_trait]
pub trait WalletTransport: Send + Sync {
    async fn authorize(
        &self,
        cluster: Cluster,
        identity: &AppIdentity,
        existing_token: Option<&AuthToken>,
    ) -> Result<AuthorizationResult, TransportError>;

    async fn deauthorize(&self, token: &AuthToken) -> Result<(), TransportError>;

    /// One signature per transaction, in input order.
    async fn sign_and_send_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<Signature>, TransportError>;

    async fn sign_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<SignedTransaction>, TransportError>;

    async fn sign_messages(
        &self,
        addresses: Vec<Address>,
        payloads: Vec<Vec<u8>>,
    ) -> Result<Vec<Vec<u8>>, TransportError>;
}

/// In-memory transport backed by `SimulatedWallet`, submitting to the same
/// simulated ledger a [`SimulatedLedgerClient`] reads from.
#[derive(Clone)]
pub struct SimulatedTransport {
    wallet: Arc<Mutex<SimulatedWallet>>,
    ledger: SharedLedger,
    latency: Duration,
}

impl SimulatedTransport {
    pub fn new(wallet: SimulatedWallet, ledger: &SimulatedLedgerClient) -> Self {
        Self {
            wallet: Arc::new(Mutex::new(wallet)),
            ledger: ledger.shared_ledger(),
            latency: Duration::ZERO,
        }
    }

    /// Artificial delay applied before every wallet round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_wallet<R>(
        &self,
        f: impl FnOnce(&mut SimulatedWallet) -> R,
    ) -> Result<R, TransportError> {
        let mut lock = self
            .wallet
            .lock()
            .map_err(|_| TransportError::Unavailable("mutex poisoned".to_string()))?;
        Ok(f(&mut lock))
    }

    /// All or nothing: a rejected entry means no transaction in `signed` landed.
    fn submit_all(&self, signed: Vec<SignedTransaction>) -> Result<Vec<Signature>, TransportError> {
        let mut lock = self
            .ledger
            .lock()
            .map_err(|_| TransportError::Unavailable("mutex poisoned".to_string()))?;
        lock.submit_batch(signed).map_err(submission_error)
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl WalletTransport for SimulatedTransport {
    async fn authorize(
        &self,
        cluster: Cluster,
        identity: &AppIdentity,
        existing_token: Option<&AuthToken>,
    ) -> Result<AuthorizationResult, TransportError> {
        self.round_trip().await;
        self.with_wallet(|wallet| wallet.authorize(cluster, identity, existing_token))?
            .map_err(wallet_error)
    }

    async fn deauthorize(&self, token: &AuthToken) -> Result<(), TransportError> {
        self.round_trip().await;
        self.with_wallet(|wallet| wallet.deauthorize(token))?
            .map_err(wallet_error)
    }

    async fn sign_and_send_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<Signature>, TransportError> {
        let signed = self.sign_transactions(transactions).await?;
        self.submit_all(signed)
    }

    async fn sign_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<SignedTransaction>, TransportError> {
        self.round_trip().await;
        self.with_wallet(|wallet| {
            transactions
                .iter()
                .map(|tx| wallet.sign_transaction(tx))
                .collect::<Result<Vec<_>, _>>()
        })?
        .map_err(wallet_error)
    }

    async fn sign_messages(
        &self,
        addresses: Vec<Address>,
        payloads: Vec<Vec<u8>>,
    ) -> Result<Vec<Vec<u8>>, TransportError> {
        self.round_trip().await;
        self.with_wallet(|wallet| {
            payloads
                .iter()
                .zip(addresses.iter().cycle())
                .map(|(payload, address)| wallet.sign_message(address, payload))
                .collect::<Result<Vec<_>, _>>()
        })?
        .map_err(wallet_error)
    }
}

fn wallet_error(rejection: SimRejection) -> TransportError {
    match rejection {
        SimRejection::Declined(message) => TransportError::Rejected {
            code: USER_DECLINED,
            message,
        },
        SimRejection::Unreachable => TransportError::Unavailable("wallet unreachable".to_string()),
        SimRejection::InvalidToken => TransportError::InvalidToken,
        SimRejection::NotAuthorized | SimRejection::UnknownAccount(_) => {
            TransportError::Rejected {
                code: NOT_AUTHORIZED,
                message: rejection.to_string(),
            }
        }
        other => TransportError::Internal(other.to_string()),
    }
}

fn submission_error(rejection: SimRejection) -> TransportError {
    match rejection {
        SimRejection::LedgerUnavailable => {
            TransportError::Unavailable("ledger unavailable".to_string())
        }
        other => TransportError::Rejected {
            code: SUBMISSION_REJECTED,
            message: other.to_string(),
        },
    }
}

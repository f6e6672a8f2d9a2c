use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use wallet_sim::{SimRejection, SimulatedLedger};
use wallet_types::{Address, Confirmation, LatestBlockhash, Signature};

pub(crate) type SharedLedger = Arc<Mutex<SimulatedLedger>>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
    #[error("unknown transaction signature {0}")]
    UnknownSignature(Signature),
    #[error("internal ledger error: {0}")]
    Internal(String),
}

/// Read side of the ledger: balances, recent blockhashes and confirmations.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Balance in lamports.
    async fn get_balance(&self, address: &Address) -> Result<u64, LedgerError>;

    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, LedgerError>;

    /// Resolves once the transaction is final, with or without an error descriptor.
    async fn confirm_transaction(&self, signature: &Signature)
        -> Result<Confirmation, LedgerError>;
}

/// Ledger client over an in-process `SimulatedLedger`.
#[derive(Clone)]
pub struct SimulatedLedgerClient {
    ledger: SharedLedger,
    latency: Duration,
    confirmation_delay: Duration,
}

impl SimulatedLedgerClient {
    pub fn new(ledger: SimulatedLedger) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            latency: Duration::ZERO,
            confirmation_delay: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Extra wait before a confirmation resolves, on top of the request latency.
    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }

    pub fn with_ledger<R>(&self, f: impl FnOnce(&mut SimulatedLedger) -> R) -> Result<R, LedgerError> {
        let mut lock = self
            .ledger
            .lock()
            .map_err(|_| LedgerError::Unavailable("mutex poisoned".to_string()))?;
        Ok(f(&mut lock))
    }

    pub(crate) fn shared_ledger(&self) -> SharedLedger {
        Arc::clone(&self.ledger)
    }

    async fn wait(&self, extra: Duration) {
        let total = self.latency + extra;
        if !total.is_zero() {
            tokio::time::sleep(total).await;
        }
    }
}

#[async_trait]
impl LedgerClient for SimulatedLedgerClient {
    async fn get_balance(&self, address: &Address) -> Result<u64, LedgerError> {
        self.wait(Duration::ZERO).await;
        self.with_ledger(|ledger| ledger.get_balance(address))?
            .map_err(ledger_error)
    }

    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, LedgerError> {
        self.wait(Duration::ZERO).await;
        self.with_ledger(|ledger| ledger.latest_blockhash())?
            .map_err(ledger_error)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
    ) -> Result<Confirmation, LedgerError> {
        self.wait(self.confirmation_delay).await;
        self.with_ledger(|ledger| ledger.confirm(signature))?
            .map_err(ledger_error)
    }
}

fn ledger_error(rejection: SimRejection) -> LedgerError {
    match rejection {
        SimRejection::LedgerUnavailable => LedgerError::Unavailable("simulated outage".to_string()),
        SimRejection::UnknownSignature(signature) => LedgerError::UnknownSignature(signature),
        other => LedgerError::Internal(other.to_string()),
    }
}

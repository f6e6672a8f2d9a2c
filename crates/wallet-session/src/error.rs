use thiserror::Error;
use wallet_types::{AmountError, Signature, TransactionErrorDescriptor, ValidationError};

use crate::{ledger::LedgerError, transport::TransportError, tx_builder::TxBuilderError};

/// Errors surfaced by the session manager. `Clone` so one handshake result can
/// be handed to every caller waiting on it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("authorization failed: {0}")]
    Authorization(String),
    #[error("wallet is not connected")]
    NotConnected,
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),
    #[error("invalid recipient address: {0}")]
    InvalidAddress(#[from] ValidationError),
    #[error("ledger query failed: {0}")]
    LedgerQuery(#[from] LedgerError),
    #[error("transaction {signature} failed: {error}")]
    TransactionFailed {
        signature: Signature,
        error: TransactionErrorDescriptor,
    },
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Builder(#[from] TxBuilderError),
}

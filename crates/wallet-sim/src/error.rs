use thiserror::Error;
use wallet_types::{Address, Signature};

/// Rejections produced by the simulated wallet and ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimRejection {
    #[error("user declined: {0}")]
    Declined(String),
    #[error("wallet unreachable")]
    Unreachable,
    #[error("auth token is not valid")]
    InvalidToken,
    #[error("no active authorization")]
    NotAuthorized,
    #[error("account {0} is not held by this wallet")]
    UnknownAccount(Address),
    #[error("ledger unavailable")]
    LedgerUnavailable,
    #[error("blockhash not found or expired")]
    BlockhashNotFound,
    #[error("insufficient funds for fee")]
    InsufficientFundsForFee,
    #[error("duplicate transaction {0}")]
    AlreadyProcessed(Signature),
    #[error("unknown signature {0}")]
    UnknownSignature(Signature),
    #[error("{0}")]
    Malformed(String),
}

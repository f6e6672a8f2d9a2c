//! Error types for identifier parsing and unit conversion.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("empty value for {0}")]
    Empty(&'static str),
    #[error("invalid base58 for {kind}: {reason}")]
    InvalidBase58 { kind: &'static str, reason: String },
    #[error("invalid length for {kind}: expected {expected}, got {actual}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{0}")]
    Message(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount must be greater than zero")]
    NotPositive,
    #[error("amount must not be negative")]
    Negative,
    #[error("amount is not a finite number")]
    NotFinite,
    #[error("amount {0} is not a whole number of lamports")]
    FractionalLamports(String),
    #[error("amount exceeds the representable lamport range")]
    Overflow,
    #[error("amount {0} is too large to convert exactly from a float; pass decimal text")]
    BeyondFloatPrecision(String),
    #[error("malformed amount `{0}`")]
    Malformed(String),
}

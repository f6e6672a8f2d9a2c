//! TransferBuilder: assemble a transfer (and optional memo) into a signable transaction.

use thiserror::Error;
use wallet_types::{Address, Blockhash, Instruction, Transaction, TransferRequest};

/// Upper bound on memo payload size accepted by the memo program in practice.
pub const MAX_MEMO_BYTES: usize = 566;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxBuilderError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("invalid transfer: {0}")]
    InvalidTransfer(&'static str),
    #[error("memo is {len} bytes, limit is {max}")]
    MemoTooLong { len: usize, max: usize },
}

/// Fluent builder. Pure: never talks to a wallet or the ledger.
#[derive(Debug, Clone, Default)]
pub struct TransferBuilder {
    sender: Option<Address>,
    recipient: Option<Address>,
    lamports: Option<u64>,
    recent_blockhash: Option<Blockhash>,
    memo: Option<String>,
}

impl TransferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transfer(mut self, sender: Address, recipient: Address, lamports: u64) -> Self {
        self.sender = Some(sender);
        self.recipient = Some(recipient);
        self.lamports = Some(lamports);
        self
    }

    pub fn with_recent_blockhash(mut self, blockhash: Blockhash) -> Self {
        self.recent_blockhash = Some(blockhash);
        self
    }

    /// Empty memos are ignored.
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        let memo = memo.into();
        self.memo = (!memo.is_empty()).then_some(memo);
        self
    }

    pub fn build(self) -> Result<Transaction, TxBuilderError> {
        let sender = self.sender.ok_or(TxBuilderError::MissingField("sender"))?;
        let recipient = self
            .recipient
            .ok_or(TxBuilderError::MissingField("recipient"))?;
        let lamports = self
            .lamports
            .ok_or(TxBuilderError::MissingField("lamports"))?;
        let recent_blockhash = self
            .recent_blockhash
            .ok_or(TxBuilderError::MissingField("recent_blockhash"))?;

        if lamports == 0 {
            return Err(TxBuilderError::InvalidTransfer("amount must be > 0"));
        }
        if sender == recipient {
            return Err(TxBuilderError::InvalidTransfer(
                "sender and recipient must be different",
            ));
        }

        let mut instructions = vec![transfer_instruction(&sender, &recipient, lamports)];
        if let Some(memo) = self.memo.as_deref() {
            if memo.len() > MAX_MEMO_BYTES {
                return Err(TxBuilderError::MemoTooLong {
                    len: memo.len(),
                    max: MAX_MEMO_BYTES,
                });
            }
            instructions.extend(memo_instruction(memo));
        }

        Ok(Transaction {
            fee_payer: sender,
            recent_blockhash,
            instructions,
        })
    }
}

pub fn transfer_instruction(from: &Address, to: &Address, lamports: u64) -> Instruction {
    Instruction::Transfer {
        from: from.clone(),
        to: to.clone(),
        lamports,
    }
}

/// `None` for an empty memo.
pub fn memo_instruction(memo: &str) -> Option<Instruction> {
    (!memo.is_empty()).then(|| Instruction::Memo {
        data: memo.as_bytes().to_vec(),
    })
}

/// Builds the transaction for `request`, paid and signed by `sender`.
pub fn build_transfer(
    sender: &Address,
    request: &TransferRequest,
    recent_blockhash: &Blockhash,
) -> Result<Transaction, TxBuilderError> {
    let mut builder = TransferBuilder::new()
        .with_transfer(
            sender.clone(),
            request.recipient.clone(),
            request.amount_lamports,
        )
        .with_recent_blockhash(recent_blockhash.clone());
    if let Some(memo) = &request.memo {
        builder = builder.with_memo(memo.as_str());
    }
    builder.build()
}

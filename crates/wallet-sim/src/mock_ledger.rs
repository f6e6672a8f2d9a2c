//! SimulatedLedger: balances, recent blockhashes, fee charging and confirmations.

use std::collections::{HashMap, HashSet};

use tracing::debug;
use wallet_types::{
    hashing::derive_blockhash, Address, Blockhash, Confirmation, LatestBlockhash, Signature,
    SignedTransaction, TransactionErrorDescriptor,
};

use crate::error::SimRejection;

pub const DEFAULT_FEE_LAMPORTS: u64 = 5_000;
/// Blocks a blockhash stays usable after it is handed out.
pub const BLOCKHASH_VALIDITY_BLOCKS: u64 = 150;
const MAX_REPORTED_CONFIRMATIONS: u64 = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ProcessedTx {
    landed_at: u64,
    error: Option<TransactionErrorDescriptor>,
}

#[derive(Debug, Clone)]
pub struct SimulatedLedger {
    seed: Vec<u8>,
    pub balances: HashMap<Address, u64>,
    pub block_height: u64,
    pub fee_lamports: u64,
    issued_blockhashes: HashMap<Blockhash, u64>,
    processed: HashMap<Signature, ProcessedTx>,
    pub failing_balance_queries: u32,
    pub failing_blockhash_queries: u32,
    pub fail_next_transaction: Option<TransactionErrorDescriptor>,
    pub balance_queries: u32,
    pub submitted: Vec<SignedTransaction>,
}

impl SimulatedLedger {
    pub fn new(balances: HashMap<Address, u64>) -> Self {
        Self {
            seed: b"simulated-ledger".to_vec(),
            balances,
            block_height: 1,
            fee_lamports: DEFAULT_FEE_LAMPORTS,
            issued_blockhashes: HashMap::new(),
            processed: HashMap::new(),
            failing_balance_queries: 0,
            failing_blockhash_queries: 0,
            fail_next_transaction: None,
            balance_queries: 0,
            submitted: Vec::new(),
        }
    }

    pub fn balance_of(&self, address: &Address) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    pub fn airdrop(&mut self, address: &Address, lamports: u64) {
        let balance = self.balances.entry(address.clone()).or_insert(0);
        *balance = balance.saturating_add(lamports);
    }

    pub fn advance_blocks(&mut self, blocks: u64) {
        self.block_height = self.block_height.saturating_add(blocks);
    }

    pub fn get_balance(&mut self, address: &Address) -> Result<u64, SimRejection> {
        self.balance_queries += 1;
        if self.failing_balance_queries > 0 {
            self.failing_balance_queries -= 1;
            return Err(SimRejection::LedgerUnavailable);
        }
        Ok(self.balance_of(address))
    }

    pub fn latest_blockhash(&mut self) -> Result<LatestBlockhash, SimRejection> {
        if self.failing_blockhash_queries > 0 {
            self.failing_blockhash_queries -= 1;
            return Err(SimRejection::LedgerUnavailable);
        }
        let blockhash = derive_blockhash(&self.seed, self.block_height);
        let last_valid_block_height = self.block_height + BLOCKHASH_VALIDITY_BLOCKS;
        self.issued_blockhashes
            .entry(blockhash.clone())
            .or_insert(last_valid_block_height);
        Ok(LatestBlockhash {
            blockhash,
            last_valid_block_height,
        })
    }

    /// Charges the fee, then applies every transfer or none of them.
    ///
    /// Rejections here mean the transaction never landed; a landed transaction
    /// whose transfers fail is recorded with an error descriptor and still pays
    /// its fee.
    pub fn submit(&mut self, signed: SignedTransaction) -> Result<Signature, SimRejection> {
        self.precheck(&signed, self.block_height)?;
        let tx = &signed.transaction;
        let payer_balance = self.balance_of(&tx.fee_payer);
        if payer_balance < self.fee_lamports {
            return Err(SimRejection::InsufficientFundsForFee);
        }
        self.balances
            .insert(tx.fee_payer.clone(), payer_balance - self.fee_lamports);

        let error = match self.fail_next_transaction.take() {
            Some(forced) => Some(forced),
            None => self.apply_transfers(&signed),
        };
        debug!(
            signature = %signed.signature,
            block_height = self.block_height,
            failed = error.is_some(),
            "simulated ledger processed transaction"
        );
        self.processed.insert(
            signed.signature.clone(),
            ProcessedTx {
                landed_at: self.block_height,
                error,
            },
        );
        self.block_height += 1;
        let signature = signed.signature.clone();
        self.submitted.push(signed);
        Ok(signature)
    }

    /// Submits every transaction or none of them. The whole batch is checked
    /// against the heights it will land at and the worst-case debits of earlier
    /// entries before the first one is applied.
    pub fn submit_batch(
        &mut self,
        batch: Vec<SignedTransaction>,
    ) -> Result<Vec<Signature>, SimRejection> {
        let mut seen = HashSet::new();
        let mut committed: HashMap<Address, u64> = HashMap::new();
        for (offset, signed) in batch.iter().enumerate() {
            if !seen.insert(signed.signature.clone()) {
                return Err(SimRejection::AlreadyProcessed(signed.signature.clone()));
            }
            self.precheck(signed, self.block_height + offset as u64)?;

            let tx = &signed.transaction;
            let debited = committed.entry(tx.fee_payer.clone()).or_insert(0);
            if self.balance_of(&tx.fee_payer) < debited.saturating_add(self.fee_lamports) {
                return Err(SimRejection::InsufficientFundsForFee);
            }
            let outgoing = tx
                .transfers()
                .fold(0u64, |sum, (_, _, lamports)| sum.saturating_add(lamports));
            *debited = debited
                .saturating_add(self.fee_lamports)
                .saturating_add(outgoing);
        }
        batch.into_iter().map(|signed| self.submit(signed)).collect()
    }

    /// Rejections that keep a transaction from landing at `height`.
    fn precheck(&self, signed: &SignedTransaction, height: u64) -> Result<(), SimRejection> {
        let tx = &signed.transaction;
        if self.processed.contains_key(&signed.signature) {
            return Err(SimRejection::AlreadyProcessed(signed.signature.clone()));
        }
        match self.issued_blockhashes.get(&tx.recent_blockhash) {
            Some(last_valid) if *last_valid >= height => {}
            _ => return Err(SimRejection::BlockhashNotFound),
        }
        if tx.transfers().any(|(from, _, _)| from != &tx.fee_payer) {
            return Err(SimRejection::Malformed(
                "transfer source must be the fee payer".to_string(),
            ));
        }
        Ok(())
    }

    pub fn confirm(&self, signature: &Signature) -> Result<Confirmation, SimRejection> {
        let processed = self
            .processed
            .get(signature)
            .ok_or_else(|| SimRejection::UnknownSignature(signature.clone()))?;
        let depth = self
            .block_height
            .saturating_sub(processed.landed_at)
            .min(MAX_REPORTED_CONFIRMATIONS);
        Ok(Confirmation {
            confirmations: depth as u32,
            error: processed.error.clone(),
        })
    }

    fn apply_transfers(&mut self, signed: &SignedTransaction) -> Option<TransactionErrorDescriptor> {
        let mut staged = self.balances.clone();
        for (from, to, lamports) in signed.transaction.transfers() {
            let available = staged.get(from).copied().unwrap_or(0);
            if available < lamports {
                return Some(TransactionErrorDescriptor::new(
                    "InsufficientFunds",
                    format!("{from} holds {available} lamports, transfer needs {lamports}"),
                ));
            }
            staged.insert(from.clone(), available - lamports);
            let credit = staged.entry(to.clone()).or_insert(0);
            *credit = credit.saturating_add(lamports);
        }
        self.balances = staged;
        None
    }
}

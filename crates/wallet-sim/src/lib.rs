//! Simulated wallet and ledger for exercising the session manager without real nodes.

pub mod error;
pub mod mock_ledger;
pub mod mock_wallet;
pub mod scenarios;

pub use error::SimRejection;
pub use mock_ledger::{SimulatedLedger, BLOCKHASH_VALIDITY_BLOCKS, DEFAULT_FEE_LAMPORTS};
pub use mock_wallet::{SimulatedAccount, SimulatedWallet};
pub use scenarios::{DemoAccounts, DemoScenario};

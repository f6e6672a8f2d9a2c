//! Wallet session manager: authorizes with an external wallet, keeps the
//! connected account's balance fresh, and submits payments and signing
//! requests on its behalf.

pub mod adapter;
pub mod config;
pub mod error;
pub mod ledger;
pub mod manager;
pub mod session;
pub mod transport;
pub mod tx_builder;

pub use adapter::{button_label, PressOutcome, WalletButton};
pub use config::SessionConfig;
pub use error::SessionError;
pub use ledger::{LedgerClient, LedgerError, SimulatedLedgerClient};
pub use manager::SessionManager;
pub use session::{SessionCredentials, SessionSnapshot, SessionStatus, WalletSession};
pub use transport::{SimulatedTransport, TransportError, WalletTransport};
pub use tx_builder::{build_transfer, TransferBuilder, TxBuilderError, MAX_MEMO_BYTES};

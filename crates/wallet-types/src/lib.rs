pub mod error;
pub mod hashing;
pub mod ids;
pub mod protocol;
pub mod tx;
pub mod units;

pub use error::{AmountError, ValidationError};
pub use ids::{Address, AuthToken, Blockhash, Signature};
pub use protocol::{
    AppIdentity, AuthorizationResult, AuthorizedAccount, Cluster, Confirmation, LatestBlockhash,
    TransactionErrorDescriptor, TransactionOutcome, TransferRequest,
};
pub use tx::{Instruction, SignedTransaction, Transaction};
pub use units::{
    display_to_lamports, format_display, lamports_to_display, parse_display_amount,
    transfer_lamports, PaymentAmount, LAMPORTS_PER_SOL, MAX_FLOAT_EXACT_LAMPORTS,
};

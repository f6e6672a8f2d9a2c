//! Records exchanged with the wallet transport and the ledger client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    error::ValidationError,
    ids::{Address, AuthToken, Blockhash, Signature},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
            Self::MainnetBeta => "mainnet-beta",
        };
        f.write_str(name)
    }
}

impl FromStr for Cluster {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            "mainnet-beta" => Ok(Self::MainnetBeta),
            other => Err(ValidationError::Message(format!("unknown cluster `{other}`"))),
        }
    }
}

/// Identity the dapp presents to the wallet during authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    pub name: String,
    pub uri: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedAccount {
    pub address: Address,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResult {
    pub accounts: Vec<AuthorizedAccount>,
    pub auth_token: AuthToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestBlockhash {
    pub blockhash: Blockhash,
    pub last_valid_block_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionErrorDescriptor {
    pub code: String,
    pub message: String,
}

impl TransactionErrorDescriptor {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for TransactionErrorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub confirmations: u32,
    pub error: Option<TransactionErrorDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub recipient: Address,
    pub amount_lamports: u64,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutcome {
    pub signature: Signature,
    pub confirmation_error: Option<TransactionErrorDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::{Cluster, TransactionErrorDescriptor};

    #[test]
    fn cluster_names_round_trip_through_display() {
        for cluster in [Cluster::Devnet, Cluster::Testnet, Cluster::MainnetBeta] {
            assert_eq!(cluster.to_string().parse::<Cluster>().unwrap(), cluster);
        }
        assert!("localnet".parse::<Cluster>().is_err());
    }

    #[test]
    fn error_descriptor_displays_code_and_message() {
        let descriptor = TransactionErrorDescriptor::new("InsufficientFunds", "needs 5 more");
        assert_eq!(descriptor.to_string(), "InsufficientFunds: needs 5 more");
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};
use wallet_types::{AppIdentity, Cluster};

/// Session manager configuration shared by every session it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cluster: Cluster,
    pub identity: AppIdentity,
    pub refresh_interval_ms: u64,
    /// Covers the user's approval in the wallet, so it is generous.
    pub authorize_timeout_ms: u64,
    pub confirm_timeout_ms: u64,
    pub ledger_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::Devnet,
            identity: AppIdentity {
                name: "Tuition Desk".to_string(),
                uri: "https://tuition-desk.example".to_string(),
                icon: "favicon.ico".to_string(),
            },
            refresh_interval_ms: 15_000,
            authorize_timeout_ms: 60_000,
            confirm_timeout_ms: 30_000,
            ledger_timeout_ms: 10_000,
        }
    }
}

impl SessionConfig {
    /// Never zero; a zero period would spin the refresh loop.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }

    pub fn authorize_timeout(&self) -> Duration {
        Duration::from_millis(self.authorize_timeout_ms)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_timeout_ms)
    }
}

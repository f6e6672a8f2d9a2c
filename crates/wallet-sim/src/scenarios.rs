use std::collections::HashMap;

use wallet_types::{Address, LAMPORTS_PER_SOL};

use crate::{
    mock_ledger::SimulatedLedger,
    mock_wallet::{SimulatedAccount, SimulatedWallet},
};

#[derive(Debug, Clone)]
pub struct DemoAccounts {
    /// Parent paying tuition; the wallet's first (default) account.
    pub parent: Address,
    /// Second account held by the same wallet.
    pub savings: Address,
    /// School treasury; not held by the wallet.
    pub school: Address,
}

#[derive(Debug, Clone)]
pub struct DemoScenario {
    pub accounts: DemoAccounts,
    pub wallet: SimulatedWallet,
    pub ledger: SimulatedLedger,
}

impl DemoScenario {
    pub fn new() -> Self {
        let parent = SimulatedAccount::from_secret([0x41; 32], Some("Family"));
        let savings = SimulatedAccount::from_secret([0x42; 32], Some("Savings"));
        let school = SimulatedAccount::from_secret([0x51; 32], Some("School Treasury"));
        let accounts = DemoAccounts {
            parent: parent.address.clone(),
            savings: savings.address.clone(),
            school: school.address.clone(),
        };

        let wallet = SimulatedWallet::new("Sim Wallet", vec![parent, savings]);
        let ledger = SimulatedLedger::new(demo_balances(&accounts));
        Self {
            accounts,
            wallet,
            ledger,
        }
    }
}

impl Default for DemoScenario {
    fn default() -> Self {
        Self::new()
    }
}

fn demo_balances(accounts: &DemoAccounts) -> HashMap<Address, u64> {
    HashMap::from([
        (accounts.parent.clone(), 10 * LAMPORTS_PER_SOL),
        (accounts.savings.clone(), 2 * LAMPORTS_PER_SOL),
        (accounts.school.clone(), 0),
    ])
}

#[cfg(test)]
mod tests {
    use wallet_types::LAMPORTS_PER_SOL;

    use super::DemoScenario;

    #[test]
    fn parent_is_the_default_account_and_funded() {
        let scenario = DemoScenario::new();
        assert_eq!(scenario.wallet.accounts()[0].address, scenario.accounts.parent);
        assert_eq!(
            scenario.ledger.balance_of(&scenario.accounts.parent),
            10 * LAMPORTS_PER_SOL
        );
        assert_ne!(scenario.accounts.parent, scenario.accounts.school);
    }
}

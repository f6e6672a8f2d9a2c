//! SimulatedWallet: in-memory signing authority with token issuance and failure injection.

use std::collections::HashSet;

use tracing::debug;
use wallet_types::{
    hashing::{sha256_32, simulated_signature, simulated_signature_bytes},
    Address, AppIdentity, AuthToken, AuthorizationResult, AuthorizedAccount, Cluster,
    SignedTransaction, Transaction,
};

use crate::error::SimRejection;

#[derive(Debug, Clone)]
pub struct SimulatedAccount {
    pub address: Address,
    pub label: Option<String>,
    secret: [u8; 32],
}

impl SimulatedAccount {
    pub fn new(address: Address, label: Option<&str>, secret: [u8; 32]) -> Self {
        Self {
            address,
            label: label.map(str::to_string),
            secret,
        }
    }

    /// Derives the address from the secret so demo accounts look like real keys.
    pub fn from_secret(secret: [u8; 32], label: Option<&str>) -> Self {
        let address = Address::from_bytes(&sha256_32(&secret));
        Self::new(address, label, secret)
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedWallet {
    name: String,
    accounts: Vec<SimulatedAccount>,
    issued_tokens: HashSet<String>,
    active_token: Option<String>,
    next_token: u64,
    pub reachable: bool,
    pub decline_next_authorization: Option<String>,
    pub fail_deauthorize: bool,
    pub authorize_calls: u32,
    pub deauthorize_calls: u32,
    pub sign_calls: u32,
    pub last_cluster: Option<Cluster>,
    pub last_identity: Option<AppIdentity>,
    pub last_presented_token: Option<AuthToken>,
    pub deauthorized_tokens: Vec<AuthToken>,
}

impl SimulatedWallet {
    pub fn new(name: impl Into<String>, accounts: Vec<SimulatedAccount>) -> Self {
        Self {
            name: name.into(),
            accounts,
            issued_tokens: HashSet::new(),
            active_token: None,
            next_token: 1,
            reachable: true,
            decline_next_authorization: None,
            fail_deauthorize: false,
            authorize_calls: 0,
            deauthorize_calls: 0,
            sign_calls: 0,
            last_cluster: None,
            last_identity: None,
            last_presented_token: None,
            deauthorized_tokens: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accounts(&self) -> &[SimulatedAccount] {
        &self.accounts
    }

    pub fn has_active_authorization(&self) -> bool {
        self.active_token.is_some()
    }

    /// Mints a token out of band, as if issued in a previous process.
    pub fn issue_token(&mut self) -> AuthToken {
        let token = format!("{}-token-{}", self.name.to_lowercase(), self.next_token);
        self.next_token += 1;
        self.issued_tokens.insert(token.clone());
        AuthToken::new(token)
    }

    /// Forgets every issued token, as a wallet does when its user revokes the dapp.
    pub fn revoke_all_tokens(&mut self) {
        self.issued_tokens.clear();
        self.active_token = None;
    }

    pub fn authorize(
        &mut self,
        cluster: Cluster,
        identity: &AppIdentity,
        existing_token: Option<&AuthToken>,
    ) -> Result<AuthorizationResult, SimRejection> {
        self.authorize_calls += 1;
        self.last_cluster = Some(cluster);
        self.last_identity = Some(identity.clone());
        self.last_presented_token = existing_token.cloned();

        if !self.reachable {
            return Err(SimRejection::Unreachable);
        }
        if let Some(reason) = self.decline_next_authorization.take() {
            return Err(SimRejection::Declined(reason));
        }
        if let Some(token) = existing_token {
            if !self.issued_tokens.remove(token.expose()) {
                return Err(SimRejection::InvalidToken);
            }
        }

        let auth_token = self.issue_token();
        self.active_token = Some(auth_token.expose().to_string());
        debug!(wallet = %self.name, %cluster, accounts = self.accounts.len(), "authorization granted");
        Ok(AuthorizationResult {
            accounts: self
                .accounts
                .iter()
                .map(|account| AuthorizedAccount {
                    address: account.address.clone(),
                    label: account.label.clone(),
                })
                .collect(),
            auth_token,
        })
    }

    pub fn deauthorize(&mut self, token: &AuthToken) -> Result<(), SimRejection> {
        self.deauthorize_calls += 1;
        self.deauthorized_tokens.push(token.clone());
        if !self.reachable || self.fail_deauthorize {
            return Err(SimRejection::Unreachable);
        }
        if !self.issued_tokens.remove(token.expose()) {
            return Err(SimRejection::InvalidToken);
        }
        if self.active_token.as_deref() == Some(token.expose()) {
            self.active_token = None;
        }
        Ok(())
    }

    pub fn sign_transaction(
        &mut self,
        transaction: &Transaction,
    ) -> Result<SignedTransaction, SimRejection> {
        self.require_authorized()?;
        self.sign_calls += 1;
        let account = self.account(&transaction.fee_payer)?;
        let signature = simulated_signature(&account.secret, &transaction.message_bytes());
        Ok(SignedTransaction {
            transaction: transaction.clone(),
            signature,
        })
    }

    pub fn sign_message(
        &mut self,
        address: &Address,
        payload: &[u8],
    ) -> Result<Vec<u8>, SimRejection> {
        self.require_authorized()?;
        self.sign_calls += 1;
        let account = self.account(address)?;
        Ok(simulated_signature_bytes(&account.secret, payload).to_vec())
    }

    fn require_authorized(&self) -> Result<(), SimRejection> {
        if !self.reachable {
            return Err(SimRejection::Unreachable);
        }
        if self.active_token.is_none() {
            return Err(SimRejection::NotAuthorized);
        }
        Ok(())
    }

    fn account(&self, address: &Address) -> Result<&SimulatedAccount, SimRejection> {
        self.accounts
            .iter()
            .find(|account| &account.address == address)
            .ok_or_else(|| SimRejection::UnknownAccount(address.clone()))
    }
}

#[cfg(test)]
mod tests {
    use wallet_types::{
        AppIdentity, AuthToken, Blockhash, Cluster, Instruction, Transaction,
    };

    use super::{SimulatedAccount, SimulatedWallet};
    use crate::error::SimRejection;

    fn identity() -> AppIdentity {
        AppIdentity {
            name: "Tuition Desk".to_string(),
            uri: "https://tuition.example".to_string(),
            icon: "favicon.ico".to_string(),
        }
    }

    fn wallet() -> SimulatedWallet {
        SimulatedWallet::new(
            "Phantomish",
            vec![SimulatedAccount::new(
                "Addr1".parse().unwrap(),
                Some("Primary"),
                [0x11; 32],
            )],
        )
    }

    fn transfer_tx() -> Transaction {
        let from = "Addr1".parse().unwrap();
        Transaction {
            fee_payer: "Addr1".parse().unwrap(),
            recent_blockhash: Blockhash::from_bytes(&[1u8; 32]),
            instructions: vec![Instruction::Transfer {
                from,
                to: "Addr2".parse().unwrap(),
                lamports: 10,
            }],
        }
    }

    #[test]
    fn authorize_issues_fresh_token_and_rotates_existing() {
        let mut wallet = wallet();
        let first = wallet.authorize(Cluster::Devnet, &identity(), None).unwrap();
        assert_eq!(first.accounts[0].address.as_str(), "Addr1");
        assert_eq!(first.accounts[0].label.as_deref(), Some("Primary"));

        let second = wallet
            .authorize(Cluster::Devnet, &identity(), Some(&first.auth_token))
            .unwrap();
        assert_ne!(first.auth_token, second.auth_token);
        // The rotated-out token is no longer accepted.
        assert_eq!(
            wallet.authorize(Cluster::Devnet, &identity(), Some(&first.auth_token)),
            Err(SimRejection::InvalidToken)
        );
    }

    #[test]
    fn decline_applies_once() {
        let mut wallet = wallet();
        wallet.decline_next_authorization = Some("user closed sheet".to_string());
        assert!(matches!(
            wallet.authorize(Cluster::Devnet, &identity(), None),
            Err(SimRejection::Declined(_))
        ));
        assert!(wallet.authorize(Cluster::Devnet, &identity(), None).is_ok());
        assert_eq!(wallet.authorize_calls, 2);
    }

    #[test]
    fn signing_requires_authorization() {
        let mut wallet = wallet();
        assert_eq!(
            wallet.sign_transaction(&transfer_tx()),
            Err(SimRejection::NotAuthorized)
        );
        let auth = wallet.authorize(Cluster::Devnet, &identity(), None).unwrap();
        let signed = wallet.sign_transaction(&transfer_tx()).unwrap();
        assert_eq!(signed.signature.to_bytes().len(), 64);

        wallet.deauthorize(&auth.auth_token).unwrap();
        assert!(!wallet.has_active_authorization());
        assert_eq!(
            wallet.sign_message(&"Addr1".parse().unwrap(), b"hi"),
            Err(SimRejection::NotAuthorized)
        );
    }

    #[test]
    fn unknown_account_cannot_sign() {
        let mut wallet = wallet();
        wallet.authorize(Cluster::Devnet, &identity(), None).unwrap();
        let mut tx = transfer_tx();
        tx.fee_payer = "Addr9".parse().unwrap();
        assert!(matches!(
            wallet.sign_transaction(&tx),
            Err(SimRejection::UnknownAccount(_))
        ));
    }

    #[test]
    fn deauthorize_unknown_token_fails_but_is_recorded() {
        let mut wallet = wallet();
        let token = AuthToken::new("never-issued");
        assert_eq!(wallet.deauthorize(&token), Err(SimRejection::InvalidToken));
        assert_eq!(wallet.deauthorized_tokens, vec![token]);
    }
}

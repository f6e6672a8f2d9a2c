//! WalletButton: the thin layer a UI binds to. It renders a label from the
//! current snapshot and forwards actions to the session manager.

use tokio::sync::watch;
use wallet_types::{format_display, Address, PaymentAmount, Signature};

use crate::{
    error::SessionError,
    ledger::LedgerClient,
    manager::SessionManager,
    session::{SessionSnapshot, SessionStatus},
    transport::WalletTransport,
};

pub const CONNECT_LABEL: &str = "Connect Wallet";

/// What a button press did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PressOutcome {
    Connected(Address),
    Disconnected,
    /// A connect or disconnect was already in flight; nothing happened.
    Busy,
}

pub fn button_label(snapshot: &SessionSnapshot) -> String {
    match snapshot.status {
        SessionStatus::Disconnected => CONNECT_LABEL.to_string(),
        SessionStatus::Connecting => "Connecting…".to_string(),
        SessionStatus::Disconnecting => "Disconnecting…".to_string(),
        SessionStatus::Connected => match (&snapshot.address, snapshot.balance_lamports) {
            (Some(address), Some(lamports)) => {
                format!("{} · {} SOL", address.shortened(), format_display(lamports))
            }
            (Some(address), None) => address.shortened(),
            (None, _) => CONNECT_LABEL.to_string(),
        },
    }
}

pub struct WalletButton<T, L>
where
    T: WalletTransport + 'static,
    L: LedgerClient + 'static,
{
    manager: SessionManager<T, L>,
}

impl<T, L> WalletButton<T, L>
where
    T: WalletTransport + 'static,
    L: LedgerClient + 'static,
{
    pub fn new(manager: SessionManager<T, L>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &SessionManager<T, L> {
        &self.manager
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.manager.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.manager.subscribe()
    }

    pub fn label(&self) -> String {
        button_label(&self.snapshot())
    }

    /// Connects when idle, disconnects when connected.
    pub async fn press(&self) -> Result<PressOutcome, SessionError> {
        match self.manager.status() {
            SessionStatus::Disconnected => self.manager.connect().await.map(PressOutcome::Connected),
            SessionStatus::Connected => {
                self.manager.disconnect().await;
                Ok(PressOutcome::Disconnected)
            }
            SessionStatus::Connecting | SessionStatus::Disconnecting => Ok(PressOutcome::Busy),
        }
    }

    pub async fn pay(
        &self,
        recipient: &str,
        amount: impl Into<PaymentAmount>,
        memo: Option<&str>,
    ) -> Result<Signature, SessionError> {
        self.manager.send_payment(recipient, amount, memo).await
    }

    pub async fn sign(&self, message: &str) -> Result<Vec<u8>, SessionError> {
        self.manager.sign_message(message).await
    }

    pub fn dismiss_error(&self) {
        self.manager.clear_error();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use wallet_sim::{SimulatedAccount, SimulatedLedger, SimulatedWallet};
    use wallet_types::{Address, LAMPORTS_PER_SOL};

    use super::{button_label, PressOutcome, WalletButton, CONNECT_LABEL};
    use crate::{
        config::SessionConfig,
        error::SessionError,
        ledger::SimulatedLedgerClient,
        manager::SessionManager,
        session::{SessionSnapshot, SessionStatus},
        transport::SimulatedTransport,
    };

    const LONG_ADDRESS: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

    fn button() -> WalletButton<SimulatedTransport, SimulatedLedgerClient> {
        let address: Address = LONG_ADDRESS.parse().unwrap();
        let wallet = SimulatedWallet::new(
            "Sim",
            vec![SimulatedAccount::new(address.clone(), None, [0x22; 32])],
        );
        let ledger = SimulatedLedgerClient::new(SimulatedLedger::new(HashMap::from([(
            address,
            LAMPORTS_PER_SOL + LAMPORTS_PER_SOL / 4,
        )])));
        let transport = SimulatedTransport::new(wallet, &ledger);
        WalletButton::new(SessionManager::new(
            transport,
            ledger,
            SessionConfig::default(),
        ))
    }

    #[test]
    fn labels_follow_status() {
        let mut snapshot = SessionSnapshot::default();
        assert_eq!(button_label(&snapshot), CONNECT_LABEL);

        snapshot.status = SessionStatus::Connecting;
        assert_eq!(button_label(&snapshot), "Connecting…");

        snapshot.status = SessionStatus::Connected;
        snapshot.address = Some(LONG_ADDRESS.parse().unwrap());
        assert_eq!(button_label(&snapshot), "9WzD…AWWM");

        snapshot.balance_lamports = Some(1_500_000_000);
        assert_eq!(button_label(&snapshot), "9WzD…AWWM · 1.5 SOL");
    }

    #[tokio::test]
    async fn press_toggles_the_session() {
        let button = button();
        assert_eq!(button.label(), CONNECT_LABEL);

        let outcome = button.press().await.unwrap();
        assert_eq!(outcome, PressOutcome::Connected(LONG_ADDRESS.parse().unwrap()));
        assert_eq!(button.label(), "9WzD…AWWM · 1.25 SOL");

        assert_eq!(button.press().await.unwrap(), PressOutcome::Disconnected);
        assert_eq!(button.label(), CONNECT_LABEL);
    }

    #[tokio::test]
    async fn errors_show_until_dismissed() {
        let button = button();
        assert_eq!(
            button.pay("Addr2", 1.0, None).await,
            Err(SessionError::NotConnected)
        );
        assert_eq!(
            button.snapshot().last_error.as_deref(),
            Some("wallet is not connected")
        );
        button.dismiss_error();
        assert!(button.snapshot().last_error.is_none());
    }
}

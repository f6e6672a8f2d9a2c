//! End-to-end session flows against the demo scenario.

use std::time::Duration;

use wallet_session::{
    PressOutcome, SessionConfig, SessionError, SessionManager, SessionStatus,
    SimulatedLedgerClient, SimulatedTransport, WalletButton,
};
use wallet_sim::{DemoAccounts, DemoScenario, DEFAULT_FEE_LAMPORTS};
use wallet_types::{Instruction, LAMPORTS_PER_SOL};

type DemoManager = SessionManager<SimulatedTransport, SimulatedLedgerClient>;

fn setup(latency: Duration) -> (DemoManager, DemoAccounts) {
    let scenario = DemoScenario::new();
    let ledger = SimulatedLedgerClient::new(scenario.ledger).with_latency(latency);
    let transport = SimulatedTransport::new(scenario.wallet, &ledger).with_latency(latency);
    let config = SessionConfig {
        refresh_interval_ms: 500,
        ..SessionConfig::default()
    };
    (
        SessionManager::new(transport, ledger, config),
        scenario.accounts,
    )
}

fn balance_of(manager: &DemoManager, address: &wallet_types::Address) -> u64 {
    manager
        .ledger()
        .with_ledger(|ledger| ledger.balance_of(address))
        .unwrap()
}

#[tokio::test]
async fn tuition_payment_reaches_the_school() {
    let (manager, accounts) = setup(Duration::ZERO);
    let address = manager.connect().await.unwrap();
    assert_eq!(address, accounts.parent);
    assert_eq!(manager.get_balance(None).await, Ok(10.0));

    let signature = manager
        .send_payment(accounts.school.as_str(), 0.5, Some("tuition"))
        .await
        .unwrap();

    assert_eq!(balance_of(&manager, &accounts.school), LAMPORTS_PER_SOL / 2);
    let expected = 10 * LAMPORTS_PER_SOL - LAMPORTS_PER_SOL / 2 - DEFAULT_FEE_LAMPORTS;
    assert_eq!(balance_of(&manager, &accounts.parent), expected);
    assert_eq!(manager.balance_lamports(), Some(expected));

    let submitted = manager
        .ledger()
        .with_ledger(|ledger| ledger.submitted.clone())
        .unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].signature, signature);
    assert!(matches!(
        submitted[0].transaction.instructions.last(),
        Some(Instruction::Memo { data }) if data == b"tuition"
    ));
    assert_eq!(
        manager.get_balance(Some(&accounts.school)).await,
        Ok(0.5)
    );
}

#[tokio::test]
async fn reconnect_issues_a_fresh_token() {
    let (manager, _) = setup(Duration::ZERO);
    manager.connect().await.unwrap();
    let first = manager.session().auth_token().cloned().unwrap();

    manager.disconnect().await;
    assert_eq!(manager.status(), SessionStatus::Disconnected);

    manager.connect().await.unwrap();
    let second = manager.session().auth_token().cloned().unwrap();
    assert_ne!(first, second);
    let calls = manager
        .transport()
        .with_wallet(|wallet| (wallet.authorize_calls, wallet.deauthorize_calls))
        .unwrap();
    assert_eq!(calls, (2, 1));
}

#[tokio::test]
async fn token_from_a_previous_manager_reauthorizes_silently() {
    let (first, accounts) = setup(Duration::ZERO);
    first.connect().await.unwrap();
    let token = first.session().auth_token().cloned().unwrap();
    first.shutdown();

    let second = SessionManager::new(
        first.transport().clone(),
        first.ledger().clone(),
        first.config().clone(),
    )
    .with_cached_token(token.clone());
    assert_eq!(second.connect().await, Ok(accounts.parent));
    let presented = second
        .transport()
        .with_wallet(|wallet| wallet.last_presented_token.clone())
        .unwrap();
    assert_eq!(presented, Some(token));
}

#[tokio::test]
async fn unreachable_wallet_can_be_retried() {
    let (manager, _) = setup(Duration::ZERO);
    manager
        .transport()
        .with_wallet(|wallet| wallet.reachable = false)
        .unwrap();
    assert!(matches!(
        manager.connect().await,
        Err(SessionError::Authorization(_))
    ));
    assert!(manager.session().holds_invariant());

    manager
        .transport()
        .with_wallet(|wallet| wallet.reachable = true)
        .unwrap();
    assert!(manager.connect().await.is_ok());
}

#[tokio::test]
async fn payment_to_own_second_account() {
    let (manager, accounts) = setup(Duration::ZERO);
    manager.connect().await.unwrap();
    manager
        .send_payment(accounts.savings.as_str(), 1.25, None)
        .await
        .unwrap();
    assert_eq!(
        balance_of(&manager, &accounts.savings),
        2 * LAMPORTS_PER_SOL + LAMPORTS_PER_SOL + LAMPORTS_PER_SOL / 4
    );
}

#[tokio::test(start_paused = true)]
async fn button_flow_with_latency_and_background_refresh() {
    let (manager, accounts) = setup(Duration::from_millis(100));
    let button = WalletButton::new(manager);

    assert_eq!(
        button.press().await.unwrap(),
        PressOutcome::Connected(accounts.parent.clone())
    );
    assert!(button.label().ends_with("· 10 SOL"));

    button
        .manager()
        .ledger()
        .with_ledger(|ledger| ledger.airdrop(&accounts.parent, LAMPORTS_PER_SOL))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert!(button.label().ends_with("· 11 SOL"));

    button.pay(accounts.school.as_str(), 0.5, Some("tuition")).await.unwrap();
    let signature = button.sign("receipt").await.unwrap();
    assert_eq!(signature.len(), 64);

    assert_eq!(button.press().await.unwrap(), PressOutcome::Disconnected);
    assert_eq!(button.snapshot().status, SessionStatus::Disconnected);
}

use std::time::Duration;

use clap::Parser;
use tracing::info;
use wallet_session::{
    button_label, PressOutcome, SessionConfig, SessionManager, SimulatedLedgerClient,
    SimulatedTransport, WalletButton,
};
use wallet_sim::DemoScenario;
use wallet_types::{Address, Cluster};

#[derive(Parser, Debug)]
#[command(name = "wallet-demo", about = "Tuition payment through a simulated wallet session")]
struct Cli {
    /// Cluster requested during authorization.
    #[arg(long, default_value = "devnet")]
    cluster: Cluster,

    #[arg(long, default_value = "2000")]
    refresh_interval_ms: u64,

    /// Artificial round-trip delay for the simulated wallet and ledger.
    #[arg(long, default_value = "150")]
    latency_ms: u64,

    /// Payment recipient; defaults to the school treasury account.
    #[arg(long)]
    recipient: Option<String>,

    /// Display units as decimal text; converted exactly.
    #[arg(long, default_value = "0.5")]
    amount: String,

    /// Attached as a memo instruction; pass an empty string to omit it.
    #[arg(long, default_value = "tuition")]
    memo: String,

    #[arg(long, default_value = "tuition receipt acknowledged")]
    message: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let scenario = DemoScenario::new();
    let accounts = scenario.accounts;
    let latency = Duration::from_millis(cli.latency_ms);

    let ledger = SimulatedLedgerClient::new(scenario.ledger).with_latency(latency);
    let transport = SimulatedTransport::new(scenario.wallet, &ledger).with_latency(latency);
    let config = SessionConfig {
        cluster: cli.cluster,
        refresh_interval_ms: cli.refresh_interval_ms,
        ..SessionConfig::default()
    };
    let button = WalletButton::new(SessionManager::new(transport, ledger, config));

    let mut updates = button.subscribe();
    let watcher = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let label = button_label(&updates.borrow_and_update());
            info!(label = %label, "wallet button updated");
        }
    });

    info!("Connecting to wallet");
    let address = match button.press().await? {
        PressOutcome::Connected(address) => address,
        other => return Err(format!("unexpected press outcome {other:?}").into()),
    };
    let balance = button.manager().get_balance(None).await?;
    info!(address = %address, balance, "Connected");

    let recipient = match cli.recipient {
        Some(recipient) => recipient.parse::<Address>()?,
        None => accounts.school,
    };
    let memo = (!cli.memo.is_empty()).then_some(cli.memo.as_str());
    info!(to = %recipient, amount = %cli.amount, "Paying tuition");
    let signature = button.pay(recipient.as_str(), cli.amount.as_str(), memo).await?;
    let received = button.manager().get_balance(Some(&recipient)).await?;
    info!(signature = %signature, recipient_balance = received, "Payment confirmed");

    let signed = button.sign(&cli.message).await?;
    info!(signature = %hex::encode(&signed), "Message signed");

    println!("{}", serde_json::to_string_pretty(&button.snapshot())?);

    button.press().await?;
    info!(label = %button.label(), "Disconnected");
    watcher.abort();
    Ok(())
}

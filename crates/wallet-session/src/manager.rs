//! SessionManager: connect/disconnect state machine, balance refresh loop,
//! payment submission and message signing over a wallet transport and a
//! ledger client.
//!
//! One manager owns one session. Handles are cheap clones of the same session
//! and can be injected wherever the host needs them.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use wallet_types::{
    lamports_to_display, Address, AuthToken, PaymentAmount, Signature, SignedTransaction,
    Transaction, TransactionOutcome, TransferRequest,
};

use crate::{
    config::SessionConfig,
    error::SessionError,
    ledger::LedgerClient,
    session::{SessionCredentials, SessionSnapshot, SessionStatus, WalletSession},
    transport::{TransportError, WalletTransport},
    tx_builder::build_transfer,
};

type ConnectFuture = Shared<BoxFuture<'static, Result<Address, SessionError>>>;

#[derive(Default)]
struct ManagerState {
    session: WalletSession,
    /// Bumped whenever a session starts or is torn down; background work
    /// tagged with an older epoch must not touch the session.
    epoch: u64,
    cached_token: Option<AuthToken>,
    pending_connect: Option<ConnectFuture>,
    refresh_task: Option<JoinHandle<()>>,
}

impl ManagerState {
    fn is_live(&self, epoch: u64) -> bool {
        self.epoch == epoch && self.session.status() == SessionStatus::Connected
    }

    fn cancel_refresh(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
    }
}

struct Inner<T, L>
where
    T: WalletTransport + 'static,
    L: LedgerClient + 'static,
{
    transport: T,
    ledger: L,
    config: SessionConfig,
    state: Mutex<ManagerState>,
    snapshots: watch::Sender<SessionSnapshot>,
}

/// Owns one wallet session. Clones share the session.
pub struct SessionManager<T, L>
where
    T: WalletTransport + 'static,
    L: LedgerClient + 'static,
{
    inner: Arc<Inner<T, L>>,
}

impl<T, L> Clone for SessionManager<T, L>
where
    T: WalletTransport + 'static,
    L: LedgerClient + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

enum ConnectStep {
    Ready(Address),
    Attach(ConnectFuture),
    Rejected(SessionError),
}

impl<T, L> SessionManager<T, L>
where
    T: WalletTransport + 'static,
    L: LedgerClient + 'static,
{
    pub fn new(transport: T, ledger: L, config: SessionConfig) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                transport,
                ledger,
                config,
                state: Mutex::new(ManagerState::default()),
                snapshots,
            }),
        }
    }

    /// Seeds a token issued in an earlier session; the next `connect()` offers
    /// it to the wallet for silent re-authorization.
    pub fn with_cached_token(self, token: AuthToken) -> Self {
        self.inner.update(|state| state.cached_token = Some(token));
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    pub fn ledger(&self) -> &L {
        &self.inner.ledger
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.read(|state| state.session.status())
    }

    pub fn address(&self) -> Option<Address> {
        self.inner.read(|state| state.session.address().cloned())
    }

    pub fn balance_lamports(&self) -> Option<u64> {
        self.inner.read(|state| state.session.balance_lamports())
    }

    pub fn last_error(&self) -> Option<SessionError> {
        self.inner.read(|state| state.session.last_error().cloned())
    }

    /// Copy of the full session record, credentials included.
    pub fn session(&self) -> WalletSession {
        self.inner.read(|state| state.session.clone())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.read(|state| state.session.snapshot())
    }

    /// Receives a new snapshot after every observable state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshots.subscribe()
    }

    pub fn clear_error(&self) {
        self.inner.update(|state| state.session.clear_error());
    }

    /// Authorizes with the wallet. Concurrent calls share one handshake; a
    /// connected session returns its address without contacting the wallet.
    pub async fn connect(&self) -> Result<Address, SessionError> {
        let inner = Arc::clone(&self.inner);
        let step = self.inner.update(|state| match state.session.status() {
            SessionStatus::Connected => match state.session.address() {
                Some(address) => ConnectStep::Ready(address.clone()),
                None => ConnectStep::Rejected(SessionError::NotConnected),
            },
            SessionStatus::Connecting => match &state.pending_connect {
                Some(pending) => ConnectStep::Attach(pending.clone()),
                None => ConnectStep::Rejected(SessionError::Authorization(
                    "handshake state lost".to_string(),
                )),
            },
            SessionStatus::Disconnecting => {
                let err = SessionError::Authorization("session is disconnecting".to_string());
                state.session.record_error(err.clone());
                ConnectStep::Rejected(err)
            }
            SessionStatus::Disconnected => {
                state.epoch += 1;
                state.session.begin_connecting();
                let epoch = state.epoch;
                let existing = state.cached_token.take();
                let handshake = tokio::spawn(inner.handshake(epoch, existing));
                let pending: ConnectFuture = async move {
                    handshake.await.unwrap_or_else(|err| {
                        Err(SessionError::Authorization(format!(
                            "handshake task ended: {err}"
                        )))
                    })
                }
                .boxed()
                .shared();
                state.pending_connect = Some(pending.clone());
                ConnectStep::Attach(pending)
            }
        });

        match step {
            ConnectStep::Ready(address) => Ok(address),
            ConnectStep::Attach(pending) => pending.await,
            ConnectStep::Rejected(err) => Err(err),
        }
    }

    /// Ends the session. The refresh loop is cancelled before anything else;
    /// deauthorization is best effort and never blocks local teardown.
    pub async fn disconnect(&self) {
        let credentials = self.inner.update(|state| {
            if state.session.status() != SessionStatus::Connected {
                return None;
            }
            state.cancel_refresh();
            state.epoch += 1;
            state.cached_token = None;
            state.session.begin_disconnecting()
        });
        let Some(credentials) = credentials else {
            debug!(status = ?self.status(), "disconnect ignored; no connected session");
            return;
        };

        let deauthorize = bounded(
            "deauthorize",
            self.inner.config.authorize_timeout(),
            self.inner.transport.deauthorize(&credentials.auth_token),
        )
        .await;
        match deauthorize {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "deauthorize failed; clearing session anyway"),
            Err(err) => warn!(error = %err, "deauthorize failed; clearing session anyway"),
        }

        self.inner.update(|state| {
            if state.session.status() == SessionStatus::Disconnecting {
                state.session.reset();
            }
        });
        info!(address = %credentials.address, "wallet disconnected");
    }

    /// Owning-component teardown: stops background work and drops the session
    /// without contacting the wallet.
    pub fn shutdown(&self) {
        self.inner.update(|state| {
            state.cancel_refresh();
            state.epoch += 1;
            state.cached_token = None;
            state.pending_connect = None;
            state.session.reset();
        });
        debug!("session manager shut down");
    }

    /// Balance in display units for `address`, or for the session account when
    /// `None`. Updates the session balance when the session account is queried.
    pub async fn get_balance(&self, address: Option<&Address>) -> Result<f64, SessionError> {
        let result = self.inner.get_balance(address).await;
        self.inner.surface(result)
    }

    /// Transfers `amount` display units to `recipient` and waits for
    /// confirmation. Returns the transaction signature.
    ///
    /// `amount` may be an `f64`, decimal text such as `"0.5"`, or a
    /// [`PaymentAmount`].
    pub async fn send_payment(
        &self,
        recipient: &str,
        amount: impl Into<PaymentAmount>,
        memo: Option<&str>,
    ) -> Result<Signature, SessionError> {
        let result = self.inner.send_payment(recipient, amount.into(), memo).await;
        self.inner.surface(result)
    }

    /// Builds the same transfer as `send_payment` and has the wallet sign it
    /// without submitting.
    pub async fn sign_transfer(
        &self,
        recipient: &str,
        amount: impl Into<PaymentAmount>,
        memo: Option<&str>,
    ) -> Result<SignedTransaction, SessionError> {
        let result = self.inner.sign_transfer(recipient, amount.into(), memo).await;
        self.inner.surface(result)
    }

    /// Signature bytes over the UTF-8 encoding of `message`.
    pub async fn sign_message(&self, message: &str) -> Result<Vec<u8>, SessionError> {
        let result = self.inner.sign_message(message).await;
        self.inner.surface(result)
    }
}

impl<T, L> Inner<T, L>
where
    T: WalletTransport + 'static,
    L: LedgerClient + 'static,
{
    fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<R>(&self, f: impl FnOnce(&ManagerState) -> R) -> R {
        f(&self.lock())
    }

    /// Mutates state and publishes the resulting snapshot under the same lock,
    /// so subscribers see changes in order.
    fn update<R>(&self, f: impl FnOnce(&mut ManagerState) -> R) -> R {
        let mut state = self.lock();
        let result = f(&mut state);
        let snapshot = state.session.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
        result
    }

    fn surface<R>(&self, result: Result<R, SessionError>) -> Result<R, SessionError> {
        if let Err(err) = &result {
            self.update(|state| state.session.record_error(err.clone()));
        }
        result
    }

    fn connected_account(&self) -> Result<(Address, u64), SessionError> {
        self.read(|state| match state.session.address() {
            Some(address) if state.session.status() == SessionStatus::Connected => {
                Ok((address.clone(), state.epoch))
            }
            _ => Err(SessionError::NotConnected),
        })
    }

    async fn handshake(
        self: Arc<Self>,
        epoch: u64,
        existing: Option<AuthToken>,
    ) -> Result<Address, SessionError> {
        info!(
            cluster = %self.config.cluster,
            reauthorize = existing.is_some(),
            "authorizing with wallet"
        );
        let authorized = bounded(
            "authorize",
            self.config.authorize_timeout(),
            self.transport.authorize(
                self.config.cluster,
                &self.config.identity,
                existing.as_ref(),
            ),
        )
        .await
        .and_then(|result| {
            result.map_err(|err| authorization_error(err, self.config.authorize_timeout_ms))
        })
        .and_then(|auth| {
            let token = auth.auth_token;
            auth.accounts
                .into_iter()
                .next()
                .map(|account| SessionCredentials {
                    address: account.address,
                    label: account.label,
                    auth_token: token,
                })
                .ok_or_else(|| {
                    SessionError::Authorization("wallet returned no accounts".to_string())
                })
        });

        let credentials = match authorized {
            Ok(credentials) => credentials,
            Err(err) => {
                warn!(error = %err, "wallet authorization failed");
                self.update(|state| {
                    if state.epoch == epoch {
                        state.pending_connect = None;
                        state.session.fail_connect(err.clone());
                    }
                });
                return Err(err);
            }
        };

        let address = credentials.address.clone();
        let token = credentials.auth_token.clone();
        let installed = self.update(|state| {
            if state.epoch != epoch || state.session.status() != SessionStatus::Connecting {
                return false;
            }
            state.pending_connect = None;
            state.session.mark_connected(credentials);
            true
        });
        if !installed {
            // Torn down mid-handshake; hand the fresh token straight back.
            if let Err(err) = self.transport.deauthorize(&token).await {
                debug!(error = %err, "deauthorize of orphaned token failed");
            }
            return Err(SessionError::Authorization(
                "session was shut down during authorization".to_string(),
            ));
        }

        info!(address = %address, "wallet connected");
        self.refresh_balance(epoch).await;
        self.start_refresh_loop(epoch);
        Ok(address)
    }

    fn start_refresh_loop(self: &Arc<Self>, epoch: u64) {
        let manager = Arc::downgrade(self);
        let period = self.config.refresh_interval();
        self.update(|state| {
            if !state.is_live(epoch) {
                return;
            }
            state.cancel_refresh();
            state.refresh_task = Some(tokio::spawn(refresh_loop(manager, epoch, period)));
        });
    }

    /// Non-fatal balance refresh for the session tagged `epoch`. Failures land
    /// in `last_error`. Returns `false` once that session is gone.
    async fn refresh_balance(&self, epoch: u64) -> bool {
        let address = self.read(|state| {
            state
                .is_live(epoch)
                .then(|| state.session.address().cloned())
                .flatten()
        });
        let Some(address) = address else {
            return false;
        };

        let result = self.query_balance(&address).await;
        self.update(|state| {
            if !state.is_live(epoch) {
                return false;
            }
            match result {
                Ok(lamports) => state.session.set_balance(lamports),
                Err(err) => {
                    warn!(address = %address, error = %err, "balance refresh failed");
                    state.session.record_error(err);
                }
            }
            true
        })
    }

    async fn query_balance(&self, address: &Address) -> Result<u64, SessionError> {
        Ok(bounded(
            "get_balance",
            self.config.ledger_timeout(),
            self.ledger.get_balance(address),
        )
        .await??)
    }

    async fn get_balance(&self, address: Option<&Address>) -> Result<f64, SessionError> {
        let (session_address, epoch) =
            self.read(|state| (state.session.address().cloned(), state.epoch));
        let target = address
            .or(session_address.as_ref())
            .cloned()
            .ok_or(SessionError::NotConnected)?;

        let lamports = self.query_balance(&target).await?;
        if session_address.as_ref() == Some(&target) {
            self.update(|state| {
                if state.is_live(epoch) {
                    state.session.set_balance(lamports);
                }
            });
        }
        Ok(lamports_to_display(lamports))
    }

    async fn prepare_transfer(
        &self,
        sender: &Address,
        recipient: &str,
        amount: &PaymentAmount,
        memo: Option<&str>,
    ) -> Result<Transaction, SessionError> {
        let amount_lamports = amount.to_lamports()?;
        let request = TransferRequest {
            recipient: Address::parse(recipient)?,
            amount_lamports,
            memo: memo.filter(|memo| !memo.is_empty()).map(str::to_string),
        };
        let recent = bounded(
            "get_latest_blockhash",
            self.config.ledger_timeout(),
            self.ledger.get_latest_blockhash(),
        )
        .await??;
        Ok(build_transfer(sender, &request, &recent.blockhash)?)
    }

    async fn send_payment(
        &self,
        recipient: &str,
        amount: PaymentAmount,
        memo: Option<&str>,
    ) -> Result<Signature, SessionError> {
        let (sender, epoch) = self.connected_account()?;
        let transaction = self.prepare_transfer(&sender, recipient, &amount, memo).await?;
        info!(
            from = %sender,
            to = recipient,
            amount = %amount,
            memo = memo.is_some(),
            "submitting payment"
        );

        let signature = self
            .transport
            .sign_and_send_transactions(vec![transaction])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                TransportError::Internal("wallet returned no signature".to_string())
            })?;

        let outcome = self.confirm(signature).await?;
        self.refresh_balance(epoch).await;
        match outcome.confirmation_error {
            None => {
                info!(signature = %outcome.signature, "payment confirmed");
                Ok(outcome.signature)
            }
            Some(error) => {
                warn!(signature = %outcome.signature, error = %error, "payment failed on ledger");
                Err(SessionError::TransactionFailed {
                    signature: outcome.signature,
                    error,
                })
            }
        }
    }

    async fn confirm(&self, signature: Signature) -> Result<TransactionOutcome, SessionError> {
        let confirmation = bounded(
            "confirm_transaction",
            self.config.confirm_timeout(),
            self.ledger.confirm_transaction(&signature),
        )
        .await??;
        debug!(
            signature = %signature,
            confirmations = confirmation.confirmations,
            "transaction confirmed"
        );
        Ok(TransactionOutcome {
            signature,
            confirmation_error: confirmation.error,
        })
    }

    async fn sign_transfer(
        &self,
        recipient: &str,
        amount: PaymentAmount,
        memo: Option<&str>,
    ) -> Result<SignedTransaction, SessionError> {
        let (sender, _) = self.connected_account()?;
        let transaction = self.prepare_transfer(&sender, recipient, &amount, memo).await?;
        self.transport
            .sign_transactions(vec![transaction])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                TransportError::Internal("wallet returned no signed transaction".to_string())
                    .into()
            })
    }

    async fn sign_message(&self, message: &str) -> Result<Vec<u8>, SessionError> {
        let (address, _) = self.connected_account()?;
        self.transport
            .sign_messages(vec![address], vec![message.as_bytes().to_vec()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                TransportError::Internal("wallet returned no message signature".to_string())
                    .into()
            })
    }
}

impl<T, L> Drop for Inner<T, L>
where
    T: WalletTransport + 'static,
    L: LedgerClient + 'static,
{
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        state.cancel_refresh();
    }
}

async fn refresh_loop<T, L>(manager: Weak<Inner<T, L>>, epoch: u64, period: Duration)
where
    T: WalletTransport + 'static,
    L: LedgerClient + 'static,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(inner) = manager.upgrade() else {
            break;
        };
        if !inner.refresh_balance(epoch).await {
            break;
        }
    }
    debug!(epoch, "balance refresh loop stopped");
}

async fn bounded<F: Future>(
    operation: &'static str,
    limit: Duration,
    fut: F,
) -> Result<F::Output, SessionError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| SessionError::Timeout {
            operation,
            timeout_ms: saturating_millis(limit),
        })
}

fn saturating_millis(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}

fn authorization_error(err: TransportError, timeout_ms: u64) -> SessionError {
    match err {
        TransportError::Timeout => SessionError::Timeout {
            operation: "authorize",
            timeout_ms,
        },
        other => SessionError::Authorization(other.to_string()),
    }
}

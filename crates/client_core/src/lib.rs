//! Session orchestration for the liquidity-pool console: one keypair, one
//! pool reference, four user-triggered actions and a single-slot status log.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use ledger::{
    pool_id, Account, AccountId, Amount, Asset, Faucet, FundingStatus, Keypair, LedgerClient,
    LedgerError, LiquidityPoolAsset, Operation, PoolId, PoolKind, TransactionBuilder,
};
use shared::{
    domain::{ActionKind, LogEntry, LogKind},
    error::{ErrorCode, PreconditionError},
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub mod config;
pub mod pending;

pub use config::{PriceBounds, SessionConfig, WithdrawMinimums};
pub use pending::{PendingFlags, PendingSnapshot};

pub const FUND_GUIDANCE: &str = "Please generate a keypair first.";
pub const CREATE_POOL_GUIDANCE: &str =
    "Please ensure you have a keypair, asset name, and token amounts.";
pub const WITHDRAW_GUIDANCE: &str =
    "Please ensure you have a keypair, liquidity pool ID, and withdrawal amount.";

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    /// Derived locally; the creating transaction has not been accepted.
    Provisional,
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolReference {
    pub id: PoolId,
    pub status: PoolStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInputs {
    pub asset_name: String,
    pub token_a_amount: String,
    pub token_b_amount: String,
    pub withdraw_amount: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    Failed,
    PreconditionFailed,
    AlreadyRunning,
}

#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub public_key: Option<AccountId>,
    pub pool: Option<PoolReference>,
    pub form: FormInputs,
    pub pending: PendingSnapshot,
    pub last_log: Option<LogEntry>,
}

#[derive(Default)]
struct SessionState {
    keypair: Option<Keypair>,
    pool: Option<PoolReference>,
    form: FormInputs,
    last_log: Option<LogEntry>,
}

struct PoolRequest {
    keypair: Keypair,
    asset_name: String,
    token_a_amount: String,
    token_b_amount: String,
}

struct WithdrawRequest {
    keypair: Keypair,
    pool: PoolReference,
    amount: String,
}

pub struct PoolSession {
    ledger: Arc<dyn LedgerClient>,
    faucet: Arc<dyn Faucet>,
    config: SessionConfig,
    inner: Mutex<SessionState>,
    pending: PendingFlags,
    events: broadcast::Sender<LogEntry>,
}

impl PoolSession {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        faucet: Arc<dyn Faucet>,
        config: SessionConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            ledger,
            faucet,
            config,
            inner: Mutex::new(SessionState::default()),
            pending: PendingFlags::default(),
            events,
        })
    }

    /// Every log entry, in order, from the moment of subscription.
    pub fn subscribe_events(&self) -> broadcast::Receiver<LogEntry> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            public_key: state.keypair.as_ref().map(Keypair::public_key),
            pool: state.pool,
            form: state.form.clone(),
            pending: self.pending.snapshot(),
            last_log: state.last_log.clone(),
        }
    }

    pub fn last_log(&self) -> Option<LogEntry> {
        self.state().last_log.clone()
    }

    pub fn public_key(&self) -> Option<AccountId> {
        self.state().keypair.as_ref().map(Keypair::public_key)
    }

    pub fn pool_reference(&self) -> Option<PoolReference> {
        self.state().pool
    }

    pub fn is_pending(&self, action: ActionKind) -> bool {
        self.pending.is_pending(action)
    }

    pub fn completed_runs(&self, action: ActionKind) -> u64 {
        self.pending.completed_runs(action)
    }

    pub fn set_asset_name(&self, value: impl Into<String>) {
        self.state().form.asset_name = value.into();
    }

    pub fn set_token_a_amount(&self, value: impl Into<String>) {
        self.state().form.token_a_amount = value.into();
    }

    pub fn set_token_b_amount(&self, value: impl Into<String>) {
        self.state().form.token_b_amount = value.into();
    }

    pub fn set_withdraw_amount(&self, value: impl Into<String>) {
        self.state().form.withdraw_amount = value.into();
    }

    /// Replaces the session keypair. Any pool reference belonged to the old
    /// issuer and is dropped with it.
    pub fn generate_keypair(&self) -> ActionOutcome {
        let action = ActionKind::GenerateKeypair;
        let Some(_busy) = self.pending.acquire(action) else {
            return ActionOutcome::AlreadyRunning;
        };

        let keypair = self.ledger.generate_keypair();
        let public_key = keypair.public_key();
        {
            let mut state = self.state();
            state.keypair = Some(keypair);
            state.pool = None;
        }
        info!(%public_key, "session: generated keypair");
        self.log(
            action,
            LogKind::Info,
            format!("Generated new keypair. Public key: {public_key}"),
        );
        ActionOutcome::Completed
    }

    pub async fn fund_account(&self) -> ActionOutcome {
        let action = ActionKind::FundAccount;
        let Some(_busy) = self.pending.acquire(action) else {
            return ActionOutcome::AlreadyRunning;
        };

        let keypair = match self.funding_keypair() {
            Ok(keypair) => keypair,
            Err(precondition) => return self.abort(precondition),
        };
        let public_key = keypair.public_key();

        match self.faucet.fund(&public_key).await {
            Ok(FundingStatus::Funded) => {
                info!(%public_key, "session: account funded");
                self.log(
                    action,
                    LogKind::Success,
                    format!("Account {public_key} successfully funded."),
                );
                ActionOutcome::Completed
            }
            Ok(FundingStatus::Declined { status }) => {
                warn!(%public_key, status, "session: faucet declined funding");
                self.log(
                    action,
                    LogKind::Failure,
                    format!("Something went wrong funding account: {public_key}."),
                );
                ActionOutcome::Failed
            }
            Err(error) => {
                warn!(
                    %public_key,
                    %error,
                    code = ?error_code(&error),
                    "session: faucet request failed"
                );
                self.log(
                    action,
                    LogKind::Failure,
                    format!("Error funding account {public_key}: {error}"),
                );
                ActionOutcome::Failed
            }
        }
    }

    pub async fn create_liquidity_pool(&self) -> ActionOutcome {
        let action = ActionKind::CreateLiquidityPool;
        let Some(_busy) = self.pending.acquire(action) else {
            return ActionOutcome::AlreadyRunning;
        };

        let request = match self.pool_request() {
            Ok(request) => request,
            Err(precondition) => return self.abort(precondition),
        };

        match self.submit_pool_creation(&request).await {
            Ok((pool_id, hash)) => {
                self.confirm_pool(pool_id);
                info!(%pool_id, %hash, "session: liquidity pool deposit submitted");
                self.log(
                    action,
                    LogKind::Success,
                    format!(
                        "Liquidity Pool created. Transaction URL: {}",
                        self.config.transaction_url(&hash)
                    ),
                );
                ActionOutcome::Completed
            }
            Err(error) => {
                warn!(
                    %error,
                    code = ?error_code(&error),
                    "session: liquidity pool creation failed"
                );
                self.log(
                    action,
                    LogKind::Failure,
                    format!("Error creating Liquidity Pool: {error}"),
                );
                ActionOutcome::Failed
            }
        }
    }

    pub async fn withdraw_from_pool(&self) -> ActionOutcome {
        let action = ActionKind::WithdrawFromPool;
        let Some(_busy) = self.pending.acquire(action) else {
            return ActionOutcome::AlreadyRunning;
        };

        let request = match self.withdraw_request() {
            Ok(request) => request,
            Err(precondition) => return self.abort(precondition),
        };
        if request.pool.status == PoolStatus::Provisional {
            warn!(
                pool_id = %request.pool.id,
                "session: withdrawing from a pool whose creation was never confirmed"
            );
        }

        match self.submit_withdrawal(&request).await {
            Ok(hash) => {
                info!(pool_id = %request.pool.id, %hash, "session: withdrawal submitted");
                self.log(
                    action,
                    LogKind::Success,
                    format!(
                        "Withdrawal successful. Transaction URL: {}",
                        self.config.transaction_url(&hash)
                    ),
                );
                ActionOutcome::Completed
            }
            Err(error) => {
                warn!(
                    %error,
                    code = ?error_code(&error),
                    "session: withdrawal failed"
                );
                self.log(
                    action,
                    LogKind::Failure,
                    format!("Error withdrawing from Liquidity Pool: {error}"),
                );
                ActionOutcome::Failed
            }
        }
    }

    async fn submit_pool_creation(&self, request: &PoolRequest) -> Result<(PoolId, String)> {
        let public_key = request.keypair.public_key();
        let account = self.ledger.load_account(&public_key).await?;

        let custom_asset = Asset::credit(&request.asset_name, public_key)?;
        let pool_asset =
            LiquidityPoolAsset::new(Asset::native(), custom_asset, self.config.pool_fee)?;
        let pool_id = pool_id(PoolKind::ConstantProduct, &pool_asset)?;
        self.record_provisional_pool(&public_key, pool_id);

        let bounds = self.config.deposit_price_bounds;
        let transaction = self
            .transaction_builder(account)
            .add_operation(Operation::change_trust(pool_asset))
            .add_operation(Operation::LiquidityPoolDeposit {
                pool_id,
                max_amount_a: Amount::parse(&request.token_a_amount)?,
                max_amount_b: Amount::parse(&request.token_b_amount)?,
                min_price: bounds.min,
                max_price: bounds.max,
            })
            .set_timeout(self.config.tx_timeout)
            .build()?;

        let signed = transaction.sign(&request.keypair)?;
        let response = self.ledger.submit_transaction(&signed).await?;
        Ok((pool_id, response.hash))
    }

    async fn submit_withdrawal(&self, request: &WithdrawRequest) -> Result<String> {
        let account = self
            .ledger
            .load_account(&request.keypair.public_key())
            .await?;

        let minimums = self.config.withdraw_minimums;
        let transaction = self
            .transaction_builder(account)
            .add_operation(Operation::LiquidityPoolWithdraw {
                pool_id: request.pool.id,
                amount: Amount::parse(&request.amount)?,
                min_amount_a: minimums.amount_a,
                min_amount_b: minimums.amount_b,
            })
            .set_timeout(self.config.tx_timeout)
            .build()?;

        let signed = transaction.sign(&request.keypair)?;
        let response = self.ledger.submit_transaction(&signed).await?;
        Ok(response.hash)
    }

    /// Stored before submission so the id is visible immediately; a failed
    /// submission leaves it provisional. Skipped when the session keypair was
    /// replaced after the request was taken.
    fn record_provisional_pool(&self, issuer: &AccountId, pool_id: PoolId) {
        let mut state = self.state();
        let current = state.keypair.as_ref().map(Keypair::public_key);
        if current.as_ref() != Some(issuer) {
            debug!(%issuer, %pool_id, "session: keypair replaced, pool reference not stored");
            return;
        }
        state.pool = Some(PoolReference {
            id: pool_id,
            status: PoolStatus::Provisional,
        });
    }

    fn transaction_builder(&self, account: Account) -> TransactionBuilder {
        TransactionBuilder::new(account, self.config.base_fee, self.config.network.clone())
    }

    fn funding_keypair(&self) -> Result<Keypair, PreconditionError> {
        self.state()
            .keypair
            .clone()
            .ok_or_else(|| PreconditionError::new(ActionKind::FundAccount, FUND_GUIDANCE))
    }

    fn pool_request(&self) -> Result<PoolRequest, PreconditionError> {
        let state = self.state();
        let form = &state.form;
        let missing =
            || PreconditionError::new(ActionKind::CreateLiquidityPool, CREATE_POOL_GUIDANCE);
        let keypair = state.keypair.clone().ok_or_else(missing)?;
        if [&form.asset_name, &form.token_a_amount, &form.token_b_amount]
            .into_iter()
            .any(|value| is_blank(value))
        {
            return Err(missing());
        }
        Ok(PoolRequest {
            keypair,
            asset_name: form.asset_name.trim().to_string(),
            token_a_amount: form.token_a_amount.clone(),
            token_b_amount: form.token_b_amount.clone(),
        })
    }

    fn withdraw_request(&self) -> Result<WithdrawRequest, PreconditionError> {
        let state = self.state();
        let missing =
            || PreconditionError::new(ActionKind::WithdrawFromPool, WITHDRAW_GUIDANCE);
        let keypair = state.keypair.clone().ok_or_else(missing)?;
        let pool = state.pool.ok_or_else(missing)?;
        if is_blank(&state.form.withdraw_amount) {
            return Err(missing());
        }
        Ok(WithdrawRequest {
            keypair,
            pool,
            amount: state.form.withdraw_amount.clone(),
        })
    }

    /// Promotes the stored reference only if it still names this pool.
    fn confirm_pool(&self, pool_id: PoolId) {
        let mut state = self.state();
        if let Some(pool) = state.pool.as_mut().filter(|pool| pool.id == pool_id) {
            pool.status = PoolStatus::Confirmed;
        }
    }

    fn abort(&self, precondition: PreconditionError) -> ActionOutcome {
        info!(action = %precondition.action, "session: precondition not met");
        self.log(precondition.action, LogKind::Guidance, precondition.message);
        ActionOutcome::PreconditionFailed
    }

    fn log(&self, action: ActionKind, kind: LogKind, message: String) {
        let entry = LogEntry::new(action, kind, message);
        self.state().last_log = Some(entry.clone());
        // No subscribers is fine; the single-slot log still holds the entry.
        let _ = self.events.send(entry);
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn error_code(error: &anyhow::Error) -> ErrorCode {
    error
        .downcast_ref::<LedgerError>()
        .map_or(ErrorCode::Internal, LedgerError::code)
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

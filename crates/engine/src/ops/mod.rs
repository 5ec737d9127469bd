use std::{sync::Arc, time::Duration};

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{
    BalanceChange, BalanceNotifier, EngineError, NoopNotifier, Registry, ResultEngine,
};

mod access;
mod admin;
mod carts;
mod checkout;
mod coupons;
mod ledger;
mod transactions;
mod wallets;

pub use transactions::TransactionListFilter;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Outcome of one optimistic attempt at a wallet mutation.
///
/// `Conflict` means another writer bumped the wallet version between our
/// read and our conditional write; the whole unit of work is rolled back
/// and retried from scratch.
pub(crate) enum Attempt<T> {
    Done(T),
    Conflict,
}

/// Bounded retry with linear backoff for wallet write conflicts.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(10),
        }
    }
}

pub struct Engine {
    database: DatabaseConnection,
    registry: Registry,
    system_wallet_id: Option<Uuid>,
    retry: RetryPolicy,
    notifier: Arc<dyn BalanceNotifier>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("system_wallet_id", &self.system_wallet_id)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Registered transaction type codes, sorted.
    pub fn transaction_type_codes(&self) -> Vec<String> {
        self.registry.type_codes()
    }

    /// Registered transaction state codes, sorted.
    pub fn transaction_state_codes(&self) -> Vec<String> {
        self.registry.state_codes()
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn system_wallet_id(&self) -> ResultEngine<Uuid> {
        self.system_wallet_id.ok_or_else(|| {
            EngineError::InvalidState("system wallet is not configured".to_string())
        })
    }

    /// Emits a balance-change notification. Post-commit only; never
    /// blocks and never fails the calling operation.
    pub(crate) fn notify(&self, user_id: &str, change: BalanceChange) {
        self.notifier.notify_balance_change(user_id, change);
    }

    /// Runs `attempt` inside its own DB transaction, retrying the whole
    /// unit of work while it reports wallet write conflicts.
    ///
    /// Commits on `Done`, rolls back on conflict or error. Exhausting
    /// the retry budget surfaces as
    /// [`EngineError::ConcurrentModificationRetryExhausted`]; nothing is
    /// ever partially applied.
    pub(crate) async fn retry_on_conflict<T, F>(&self, label: &str, attempt: F) -> ResultEngine<T>
    where
        F: for<'c> Fn(
            &'c DatabaseTransaction,
        ) -> std::pin::Pin<
            Box<dyn Future<Output = ResultEngine<Attempt<T>>> + Send + 'c>,
        >,
    {
        for round in 0..self.retry.max_attempts {
            let db_tx = self.database.begin().await?;
            match attempt(&db_tx).await {
                Ok(Attempt::Done(value)) => {
                    db_tx.commit().await?;
                    return Ok(value);
                }
                Ok(Attempt::Conflict) => {
                    db_tx.rollback().await?;
                    tracing::debug!(label, round, "wallet write conflict, retrying");
                    tokio::time::sleep(self.retry.backoff * (round + 1)).await;
                }
                // Transient infrastructure failures (lock timeouts) get
                // the same bounded retry as a stale write.
                Err(EngineError::Database(db_err)) if is_transient(&db_err) => {
                    let _ = db_tx.rollback().await;
                    tracing::debug!(label, round, "transient database error, retrying: {db_err}");
                    tokio::time::sleep(self.retry.backoff * (round + 1)).await;
                }
                Err(err) => {
                    db_tx.rollback().await?;
                    return Err(err);
                }
            }
        }

        Err(EngineError::ConcurrentModificationRetryExhausted(
            label.to_string(),
        ))
    }
}

fn is_transient(err: &sea_orm::DbErr) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("locked") || msg.contains("busy") || msg.contains("timed out")
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed: String = value.nfkc().collect::<String>().trim().to_string();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed)
}

pub(crate) fn normalize_coupon_code(value: &str) -> ResultEngine<String> {
    let code: String = value.nfkc().collect::<String>().trim().to_uppercase();
    if code.is_empty() {
        return Err(EngineError::InvalidAmount(
            "coupon code must not be empty".to_string(),
        ));
    }
    Ok(code)
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    system_wallet_id: Option<Uuid>,
    retry: RetryPolicy,
    notifier: Arc<dyn BalanceNotifier>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            system_wallet_id: None,
            retry: RetryPolicy::default(),
            notifier: Arc::new(NoopNotifier),
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Wallet that administrative supply operations settle against.
    ///
    /// Resolved once at startup and passed in here; the engine holds no
    /// process-wide mutable state for it.
    pub fn system_wallet(mut self, wallet_id: Uuid) -> EngineBuilder {
        self.system_wallet_id = Some(wallet_id);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> EngineBuilder {
        self.retry = retry;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn BalanceNotifier>) -> EngineBuilder {
        self.notifier = notifier;
        self
    }

    /// Construct `Engine`, loading the transaction type/state registry
    /// from the lookup tables.
    pub async fn build(self) -> ResultEngine<Engine> {
        let registry = Registry::load(&self.database).await?;
        Ok(Engine {
            database: self.database,
            registry,
            system_wallet_id: self.system_wallet_id,
            retry: self.retry,
            notifier: self.notifier,
        })
    }
}

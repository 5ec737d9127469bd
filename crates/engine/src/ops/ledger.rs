//! Balance mutator: the only code path that changes wallet balances.
//!
//! Every mutation follows the same protocol inside one DB transaction:
//! read the wallet row, validate the resulting balance, write it back
//! with a compare-and-swap on `version`, and insert the paired
//! transaction row. A failed swap rolls the whole unit of work back and
//! the operation is retried from scratch; on success the owner is
//! notified post-commit. No partial state is ever visible: a failed
//! debit leaves the wallet untouched and writes no orphan transaction.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseTransaction, QueryFilter, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    BalanceChange, BalanceKind, CreditCmd, DebitCmd, Direction, EngineError, Money, ResultEngine,
    Transaction, TransferCmd, Wallet, registry::states, transactions, wallets,
};

use super::{Attempt, Engine};

impl Engine {
    /// Computes the balance pair after applying `amount` in `direction`
    /// to the `kind` balance of `model`.
    ///
    /// Debits that would take the balance negative fail with
    /// [`EngineError::InsufficientFunds`].
    pub(super) fn balance_after(
        model: &wallets::Model,
        kind: BalanceKind,
        direction: Direction,
        amount: Money,
    ) -> ResultEngine<(Money, Money)> {
        let overflow = || EngineError::InvalidAmount("balance overflow".to_string());

        let current = match kind {
            BalanceKind::Becoin => Money::new(model.becoin),
            BalanceKind::BecoinGreen => Money::new(model.becoin_green),
        };
        let new = match direction {
            Direction::Credit => current.checked_add(amount).ok_or_else(overflow)?,
            Direction::Debit => current.checked_sub(amount).ok_or_else(overflow)?,
        };
        if new.is_negative() {
            return Err(EngineError::InsufficientFunds(format!(
                "wallet {}: balance {current}, debit {amount}",
                model.id
            )));
        }

        Ok(match kind {
            BalanceKind::Becoin => (new, Money::new(model.becoin_green)),
            BalanceKind::BecoinGreen => (Money::new(model.becoin), new),
        })
    }

    /// Conditional balance write keyed on the wallet version.
    ///
    /// Returns `Conflict` when another writer got there first; the
    /// caller must roll back and retry its whole unit of work.
    pub(super) async fn apply_delta_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        model: &wallets::Model,
        kind: BalanceKind,
        direction: Direction,
        amount: Money,
    ) -> ResultEngine<Attempt<(Money, Money)>> {
        let (new_becoin, new_green) = Self::balance_after(model, kind, direction, amount)?;

        let result = wallets::Entity::update_many()
            .col_expr(wallets::Column::Becoin, Expr::value(new_becoin.minor()))
            .col_expr(wallets::Column::BecoinGreen, Expr::value(new_green.minor()))
            .col_expr(wallets::Column::Version, Expr::value(model.version + 1))
            .filter(wallets::Column::Id.eq(model.id.clone()))
            .filter(wallets::Column::Version.eq(model.version))
            .exec(db_tx)
            .await?;

        if result.rows_affected == 0 {
            return Ok(Attempt::Conflict);
        }
        Ok(Attempt::Done((new_becoin, new_green)))
    }

    pub(super) async fn insert_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        tx: &Transaction,
    ) -> ResultEngine<()> {
        transactions::ActiveModel::from(tx).insert(db_tx).await?;
        Ok(())
    }

    /// Snapshot of `model` with the post-write balances applied.
    fn wallet_after(
        model: &wallets::Model,
        new_becoin: Money,
        new_green: Money,
    ) -> ResultEngine<Wallet> {
        let mut wallet = Wallet::try_from(model.clone())?;
        wallet.becoin = new_becoin;
        wallet.becoin_green = new_green;
        wallet.version = model.version + 1;
        Ok(wallet)
    }

    fn balance_change(wallet: &Wallet, message: String, success: bool) -> BalanceChange {
        BalanceChange {
            wallet_id: wallet.id,
            becoin_minor: wallet.becoin.minor(),
            becoin_green_minor: wallet.becoin_green.minor(),
            message,
            success,
            cleared_transaction_id: None,
        }
    }

    async fn mutate_attempt(
        &self,
        db_tx: &DatabaseTransaction,
        wallet_id: Uuid,
        kind: BalanceKind,
        direction: Direction,
        amount: Money,
        type_code: &str,
        note: Option<&str>,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Attempt<(Wallet, Transaction)>> {
        let model = self.require_wallet(db_tx, wallet_id).await?;

        let (new_becoin, new_green) = match self
            .apply_delta_in_tx(db_tx, &model, kind, direction, amount)
            .await?
        {
            Attempt::Done(balances) => balances,
            Attempt::Conflict => return Ok(Attempt::Conflict),
        };

        let mut tx = Transaction::new(
            wallet_id,
            type_code.to_string(),
            states::COMPLETED.to_string(),
            kind,
            direction,
            amount,
            created_by.to_string(),
            now,
        )?;
        tx.note = note.map(ToString::to_string);
        self.insert_transaction(db_tx, &tx).await?;

        let wallet = Self::wallet_after(&model, new_becoin, new_green)?;
        Ok(Attempt::Done((wallet, tx)))
    }

    /// Credit `amount` to a wallet, recording a transaction of
    /// `type_code`.
    pub async fn credit(&self, cmd: CreditCmd) -> ResultEngine<(Wallet, Transaction)> {
        self.registry().require_type(&cmd.type_code)?;
        let now = Utc::now();

        let (wallet, tx) = self
            .retry_on_conflict("credit", |db_tx| {
                let cmd = &cmd;
                Box::pin(async move {
                    self.mutate_attempt(
                        db_tx,
                        cmd.wallet_id,
                        cmd.balance,
                        Direction::Credit,
                        cmd.amount,
                        &cmd.type_code,
                        cmd.note.as_deref(),
                        &cmd.created_by,
                        now,
                    )
                    .await
                })
            })
            .await?;

        self.notify(
            &wallet.user_id,
            Self::balance_change(
                &wallet,
                format!("{}: +{} {}", cmd.type_code, cmd.amount, cmd.balance.as_str()),
                true,
            ),
        );
        Ok((wallet, tx))
    }

    /// Debit `amount` from a wallet, recording a transaction of
    /// `type_code`.
    ///
    /// Each call is a distinct economic event; the operation is not
    /// idempotent by design.
    pub async fn debit(&self, cmd: DebitCmd) -> ResultEngine<(Wallet, Transaction)> {
        self.registry().require_type(&cmd.type_code)?;
        let now = Utc::now();

        let (wallet, tx) = self
            .retry_on_conflict("debit", |db_tx| {
                let cmd = &cmd;
                Box::pin(async move {
                    self.mutate_attempt(
                        db_tx,
                        cmd.wallet_id,
                        cmd.balance,
                        Direction::Debit,
                        cmd.amount,
                        &cmd.type_code,
                        cmd.note.as_deref(),
                        &cmd.created_by,
                        now,
                    )
                    .await
                })
            })
            .await?;

        self.notify(
            &wallet.user_id,
            Self::balance_change(
                &wallet,
                format!("{}: -{} {}", cmd.type_code, cmd.amount, cmd.balance.as_str()),
                true,
            ),
        );
        Ok((wallet, tx))
    }

    /// Move `amount` between two wallets as one unit of work: debit the
    /// source, credit the destination, two transaction rows referencing
    /// each other's wallet as counterparty. If either leg fails, both
    /// roll back; a single-legged transfer can never be observed.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<(Wallet, Wallet)> {
        if cmd.from_wallet_id == cmd.to_wallet_id {
            return Err(EngineError::InvalidAmount(
                "from_wallet_id and to_wallet_id must differ".to_string(),
            ));
        }
        self.registry().require_type(&cmd.type_code)?;
        let now = Utc::now();

        let (from_wallet, to_wallet) = self
            .retry_on_conflict("transfer", |db_tx| {
                let cmd = &cmd;
                Box::pin(async move {
                    let from_model = self.require_wallet(db_tx, cmd.from_wallet_id).await?;
                    let to_model = self.require_wallet(db_tx, cmd.to_wallet_id).await?;

                    let (from_becoin, from_green) = match self
                        .apply_delta_in_tx(
                            db_tx,
                            &from_model,
                            cmd.balance,
                            Direction::Debit,
                            cmd.amount,
                        )
                        .await?
                    {
                        Attempt::Done(balances) => balances,
                        Attempt::Conflict => return Ok(Attempt::Conflict),
                    };
                    let (to_becoin, to_green) = match self
                        .apply_delta_in_tx(
                            db_tx,
                            &to_model,
                            cmd.balance,
                            Direction::Credit,
                            cmd.amount,
                        )
                        .await?
                    {
                        Attempt::Done(balances) => balances,
                        Attempt::Conflict => return Ok(Attempt::Conflict),
                    };

                    let mut debit_tx = Transaction::new(
                        cmd.from_wallet_id,
                        cmd.type_code.clone(),
                        states::COMPLETED.to_string(),
                        cmd.balance,
                        Direction::Debit,
                        cmd.amount,
                        cmd.created_by.clone(),
                        now,
                    )?;
                    debit_tx.related_wallet_id = Some(cmd.to_wallet_id);
                    debit_tx.note = cmd.note.clone();
                    self.insert_transaction(db_tx, &debit_tx).await?;

                    let mut credit_tx = Transaction::new(
                        cmd.to_wallet_id,
                        cmd.type_code.clone(),
                        states::COMPLETED.to_string(),
                        cmd.balance,
                        Direction::Credit,
                        cmd.amount,
                        cmd.created_by.clone(),
                        now,
                    )?;
                    credit_tx.related_wallet_id = Some(cmd.from_wallet_id);
                    credit_tx.note = cmd.note.clone();
                    self.insert_transaction(db_tx, &credit_tx).await?;

                    let from_wallet = Self::wallet_after(&from_model, from_becoin, from_green)?;
                    let to_wallet = Self::wallet_after(&to_model, to_becoin, to_green)?;
                    Ok(Attempt::Done((from_wallet, to_wallet)))
                })
            })
            .await?;

        self.notify(
            &from_wallet.user_id,
            Self::balance_change(
                &from_wallet,
                format!("{}: -{} {}", cmd.type_code, cmd.amount, cmd.balance.as_str()),
                true,
            ),
        );
        self.notify(
            &to_wallet.user_id,
            Self::balance_change(
                &to_wallet,
                format!("{}: +{} {}", cmd.type_code, cmd.amount, cmd.balance.as_str()),
                true,
            ),
        );
        Ok((from_wallet, to_wallet))
    }
}

//! Administrative becoin supply operations.
//!
//! `CREATE` credits the configured system wallet, `DESTROY` debits it
//! (and fails rather than drive it negative). Each operation writes the
//! 1:1 `admin_becoins` row alongside the `MINT`/`DESTROY` transaction.
//! Capability gating (finance permission) is the caller's concern.

use chrono::Utc;
use sea_orm::ActiveModelTrait;
use uuid::Uuid;

use crate::{
    AdminBecoin, AdminMintCmd, AdminOperation, BalanceChange, BalanceKind, Direction, EngineError,
    ResultEngine, Transaction, Wallet, admin_becoins, registry::codes, registry::states,
};

use super::{Attempt, Engine};

impl Engine {
    /// Create or destroy becoin supply on the system wallet.
    pub async fn admin_mint(&self, cmd: AdminMintCmd) -> ResultEngine<(Wallet, AdminBecoin)> {
        let system_wallet_id = self.system_wallet_id()?;
        let (type_code, direction) = match cmd.operation {
            AdminOperation::Create => (codes::MINT, Direction::Credit),
            AdminOperation::Destroy => (codes::DESTROY, Direction::Debit),
        };
        self.registry().require_type(type_code)?;
        let now = Utc::now();

        let (wallet, record) = self
            .retry_on_conflict("admin_mint", |db_tx| {
                let cmd = &cmd;
                Box::pin(async move {
                    let wallet_model = self.require_wallet(db_tx, system_wallet_id).await?;

                    let (new_becoin, new_green) = match self
                        .apply_delta_in_tx(
                            db_tx,
                            &wallet_model,
                            BalanceKind::Becoin,
                            direction,
                            cmd.amount,
                        )
                        .await?
                    {
                        Attempt::Done(balances) => balances,
                        Attempt::Conflict => return Ok(Attempt::Conflict),
                    };

                    let mut tx = Transaction::new(
                        system_wallet_id,
                        type_code.to_string(),
                        states::COMPLETED.to_string(),
                        BalanceKind::Becoin,
                        direction,
                        cmd.amount,
                        cmd.created_by.clone(),
                        now,
                    )?;
                    tx.note = cmd.note.clone();
                    self.insert_transaction(db_tx, &tx).await?;

                    let record = AdminBecoin {
                        id: Uuid::new_v4(),
                        transaction_id: tx.id,
                        operation: cmd.operation,
                        amount: cmd.amount,
                        created_by: cmd.created_by.clone(),
                        created_at: now,
                    };
                    admin_becoins::ActiveModel::from(&record).insert(db_tx).await?;

                    let mut wallet = Wallet::try_from(wallet_model)?;
                    wallet.becoin = new_becoin;
                    wallet.becoin_green = new_green;
                    wallet.version += 1;
                    Ok::<_, EngineError>(Attempt::Done((wallet, record)))
                })
            })
            .await?;

        self.notify(
            &wallet.user_id,
            BalanceChange {
                wallet_id: wallet.id,
                becoin_minor: wallet.becoin.minor(),
                becoin_green_minor: wallet.becoin_green.minor(),
                message: format!(
                    "{}: {}{} becoin",
                    type_code,
                    match direction {
                        Direction::Credit => "+",
                        Direction::Debit => "-",
                    },
                    cmd.amount
                ),
                success: true,
                cleared_transaction_id: None,
            },
        );
        Ok((wallet, record))
    }
}

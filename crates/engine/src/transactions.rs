//! Transaction primitives.
//!
//! A `Transaction` is the immutable audit record of a single balance
//! change. Rows are never updated after insertion except for the
//! `state_code` lifecycle (`PENDING` → `COMPLETED`/`FAILED`/`CANCELLED`);
//! terminal states never change again.
//!
//! Type and state are open string codes validated against the
//! [`Registry`](crate::Registry) rather than a closed enum, so new
//! transaction kinds are data migrations, not code changes.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BalanceKind, EngineError, Money};

/// Direction of a balance change, relative to the owning wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

impl TryFrom<&str> for Direction {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid direction: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub type_code: String,
    pub state_code: String,
    pub balance: BalanceKind,
    pub direction: Direction,
    /// Always positive; the sign lives in `direction`.
    pub amount: Money,
    /// Counterparty wallet for transfers.
    pub related_wallet_id: Option<Uuid>,
    /// Order this transaction settles, when it settles one.
    pub order_id: Option<Uuid>,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        wallet_id: Uuid,
        type_code: String,
        state_code: String,
        balance: BalanceKind,
        direction: Direction,
        amount: Money,
        created_by: String,
        created_at: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            wallet_id,
            type_code,
            state_code,
            balance,
            direction,
            amount,
            related_wallet_id: None,
            order_id: None,
            note: None,
            created_by,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub wallet_id: String,
    pub type_code: String,
    pub state_code: String,
    pub balance: String,
    pub direction: String,
    pub amount_minor: i64,
    pub related_wallet_id: Option<String>,
    pub order_id: Option<String>,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Wallets,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            wallet_id: ActiveValue::Set(tx.wallet_id.to_string()),
            type_code: ActiveValue::Set(tx.type_code.clone()),
            state_code: ActiveValue::Set(tx.state_code.clone()),
            balance: ActiveValue::Set(tx.balance.as_str().to_string()),
            direction: ActiveValue::Set(tx.direction.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount.minor()),
            related_wallet_id: ActiveValue::Set(tx.related_wallet_id.map(|id| id.to_string())),
            order_id: ActiveValue::Set(tx.order_id.map(|id| id.to_string())),
            note: ActiveValue::Set(tx.note.clone()),
            created_by: ActiveValue::Set(tx.created_by.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            wallet_id: Uuid::parse_str(&model.wallet_id)
                .map_err(|_| EngineError::WalletNotFound(model.wallet_id.clone()))?,
            type_code: model.type_code,
            state_code: model.state_code,
            balance: BalanceKind::try_from(model.balance.as_str())?,
            direction: Direction::try_from(model.direction.as_str())?,
            amount: Money::new(model.amount_minor),
            related_wallet_id: model
                .related_wallet_id
                .and_then(|s| Uuid::parse_str(&s).ok()),
            order_id: model.order_id.and_then(|s| Uuid::parse_str(&s).ok()),
            note: model.note,
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}

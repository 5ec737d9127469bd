//! The module contains the `Wallet` struct and its entity.
//!
//! A wallet holds the two platform balances (`becoin` and
//! `becoin_green`) for exactly one user. Balances are only ever changed
//! through the engine's ledger operations, which pair every change with
//! a transaction row; the `version` column is the compare-and-swap
//! token those operations use to serialize concurrent writers.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Money};

/// Which of the two wallet balances an operation touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceKind {
    Becoin,
    BecoinGreen,
}

impl BalanceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Becoin => "becoin",
            Self::BecoinGreen => "becoin_green",
        }
    }
}

impl TryFrom<&str> for BalanceKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "becoin" => Ok(Self::Becoin),
            "becoin_green" => Ok(Self::BecoinGreen),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid balance kind: {other}"
            ))),
        }
    }
}

/// A user's wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wallet {
    /// Stable identifier, generated once and persisted.
    pub id: Uuid,
    pub user_id: String,
    pub becoin: Money,
    pub becoin_green: Money,
    /// Optimistic-lock counter, bumped on every balance write.
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(user_id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            becoin: Money::ZERO,
            becoin_green: Money::ZERO,
            version: 0,
            created_at,
        }
    }

    /// Returns the balance selected by `kind`.
    #[must_use]
    pub fn balance(&self, kind: BalanceKind) -> Money {
        match kind {
            BalanceKind::Becoin => self.becoin,
            BalanceKind::BecoinGreen => self.becoin_green,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub user_id: String,
    pub becoin: i64,
    pub becoin_green: i64,
    pub version: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            becoin: ActiveValue::Set(value.becoin.minor()),
            becoin_green: ActiveValue::Set(value.becoin_green.minor()),
            version: ActiveValue::Set(value.version),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::WalletNotFound(model.id.clone()))?,
            user_id: model.user_id,
            becoin: Money::new(model.becoin),
            becoin_green: Money::new(model.becoin_green),
            version: model.version,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_wallet_starts_empty() {
        let wallet = Wallet::new("alice".to_string(), Utc::now());
        assert_eq!(wallet.becoin, Money::ZERO);
        assert_eq!(wallet.becoin_green, Money::ZERO);
        assert_eq!(wallet.version, 0);
        assert_eq!(wallet.balance(BalanceKind::Becoin), Money::ZERO);
    }
}

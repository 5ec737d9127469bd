//! Orders.
//!
//! An order is the immutable snapshot of a settled cart. Totals are
//! frozen at creation (they must equal the sum of the frozen order
//! items) and are never recomputed afterwards; only `status_code` and
//! `observation` may change.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{CartTotals, EngineError, Grams, Money};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub id: Uuid,
    /// Human-readable sequential code, e.g. `ORD-000042`.
    pub code: String,
    pub user_id: String,
    pub wallet_id: Uuid,
    pub payment_type_code: String,
    /// Delivery status code, validated against `delivery_statuses`.
    pub status_code: String,
    pub coupon_id: Option<Uuid>,
    pub totals: CartTotals,
    /// Discount actually applied at checkout, already subtracted from
    /// the amount charged.
    pub discount: Money,
    pub observation: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Formats the sequential order code.
    #[must_use]
    pub fn format_code(sequence: i64) -> String {
        format!("ORD-{sequence:06}")
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub code: String,
    pub user_id: String,
    pub wallet_id: String,
    pub payment_type_code: String,
    pub status_code: String,
    pub coupon_id: Option<String>,
    pub total_amount: i64,
    pub total_items: i64,
    pub total_becoin: i64,
    pub total_weight: i64,
    pub total_weight_recycled: i64,
    pub discount_minor: i64,
    pub observation: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Wallets,
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Order> for ActiveModel {
    fn from(order: &Order) -> Self {
        Self {
            id: ActiveValue::Set(order.id.to_string()),
            code: ActiveValue::Set(order.code.clone()),
            user_id: ActiveValue::Set(order.user_id.clone()),
            wallet_id: ActiveValue::Set(order.wallet_id.to_string()),
            payment_type_code: ActiveValue::Set(order.payment_type_code.clone()),
            status_code: ActiveValue::Set(order.status_code.clone()),
            coupon_id: ActiveValue::Set(order.coupon_id.map(|id| id.to_string())),
            total_amount: ActiveValue::Set(order.totals.amount.minor()),
            total_items: ActiveValue::Set(order.totals.items),
            total_becoin: ActiveValue::Set(order.totals.becoin.minor()),
            total_weight: ActiveValue::Set(order.totals.weight.grams()),
            total_weight_recycled: ActiveValue::Set(order.totals.weight_recycled.grams()),
            discount_minor: ActiveValue::Set(order.discount.minor()),
            observation: ActiveValue::Set(order.observation.clone()),
            created_at: ActiveValue::Set(order.created_at),
        }
    }
}

impl TryFrom<Model> for Order {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("order not exists".to_string()))?,
            code: model.code,
            user_id: model.user_id,
            wallet_id: Uuid::parse_str(&model.wallet_id)
                .map_err(|_| EngineError::WalletNotFound(model.wallet_id.clone()))?,
            payment_type_code: model.payment_type_code,
            status_code: model.status_code,
            coupon_id: model.coupon_id.and_then(|s| Uuid::parse_str(&s).ok()),
            totals: CartTotals {
                amount: Money::new(model.total_amount),
                items: model.total_items,
                becoin: Money::new(model.total_becoin),
                weight: Grams::new(model.total_weight),
                weight_recycled: Grams::new(model.total_weight_recycled),
            },
            discount: Money::new(model.discount_minor),
            observation: model.observation,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_zero_padded() {
        assert_eq!(Order::format_code(1), "ORD-000001");
        assert_eq!(Order::format_code(42), "ORD-000042");
        assert_eq!(Order::format_code(1_234_567), "ORD-1234567");
    }
}

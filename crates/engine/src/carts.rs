//! Cart staging area.
//!
//! A cart is the mutable pre-order staging area, one active cart per
//! user. Its five totals are *derived*: they are recomputed as a pure
//! function of the full item set after every item mutation
//! ([`CartTotals::from_items`]), never patched incrementally, so they
//! cannot drift from the items they summarize.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Grams, Money, cart_items::CartItem};

/// Aggregates over a cart's (or order's) item set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CartTotals {
    pub amount: Money,
    pub items: i64,
    pub becoin: Money,
    pub weight: Grams,
    pub weight_recycled: Grams,
}

impl CartTotals {
    /// Recomputes every aggregate from scratch.
    pub fn from_items(items: &[CartItem]) -> Result<Self, EngineError> {
        let overflow = || EngineError::InvalidAmount("cart totals overflow".to_string());

        let mut totals = Self::default();
        for item in items {
            let line_amount = item
                .unit_price
                .checked_mul(item.quantity)
                .ok_or_else(overflow)?;
            let line_becoin = item
                .unit_becoin
                .checked_mul(item.quantity)
                .ok_or_else(overflow)?;
            let line_weight = item
                .unit_weight
                .checked_mul(item.quantity)
                .ok_or_else(overflow)?;

            totals.amount = totals.amount.checked_add(line_amount).ok_or_else(overflow)?;
            totals.becoin = totals.becoin.checked_add(line_becoin).ok_or_else(overflow)?;
            totals.weight += line_weight;
            if item.recycled {
                totals.weight_recycled += line_weight;
            }
            totals.items += item.quantity;
        }
        Ok(totals)
    }
}

/// A user's active cart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: String,
    pub totals: CartTotals,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(user_id: String, updated_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            totals: CartTotals::default(),
            updated_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "carts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub user_id: String,
    pub total_amount: i64,
    pub total_items: i64,
    pub total_becoin: i64,
    pub total_weight: i64,
    pub total_weight_recycled: i64,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cart_items::Entity")]
    CartItems,
}

impl Related<super::cart_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Cart> for ActiveModel {
    fn from(cart: &Cart) -> Self {
        Self {
            id: ActiveValue::Set(cart.id.to_string()),
            user_id: ActiveValue::Set(cart.user_id.clone()),
            total_amount: ActiveValue::Set(cart.totals.amount.minor()),
            total_items: ActiveValue::Set(cart.totals.items),
            total_becoin: ActiveValue::Set(cart.totals.becoin.minor()),
            total_weight: ActiveValue::Set(cart.totals.weight.grams()),
            total_weight_recycled: ActiveValue::Set(cart.totals.weight_recycled.grams()),
            updated_at: ActiveValue::Set(cart.updated_at),
        }
    }
}

impl TryFrom<Model> for Cart {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("cart not exists".to_string()))?,
            user_id: model.user_id,
            totals: CartTotals {
                amount: Money::new(model.total_amount),
                items: model.total_items,
                becoin: Money::new(model.total_becoin),
                weight: Grams::new(model.total_weight),
                weight_recycled: Grams::new(model.total_weight_recycled),
            },
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, becoin: i64, weight: i64, qty: i64, recycled: bool) -> CartItem {
        CartItem {
            id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            name: "item".to_string(),
            quantity: qty,
            unit_price: Money::new(price),
            unit_becoin: Money::new(becoin),
            unit_weight: Grams::new(weight),
            recycled,
        }
    }

    #[test]
    fn totals_are_a_pure_function_of_items() {
        let items = vec![
            item(1000, 500, 250, 2, true),
            item(500, 200, 100, 1, false),
        ];
        let totals = CartTotals::from_items(&items).unwrap();
        assert_eq!(totals.amount, Money::new(2500));
        assert_eq!(totals.items, 3);
        assert_eq!(totals.becoin, Money::new(1200));
        assert_eq!(totals.weight, Grams::new(600));
        assert_eq!(totals.weight_recycled, Grams::new(500));
    }

    #[test]
    fn empty_item_set_totals_to_zero() {
        let totals = CartTotals::from_items(&[]).unwrap();
        assert_eq!(totals, CartTotals::default());
    }
}

//! Order line items: frozen copies of cart items, written once at
//! checkout and never touched again.

use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Grams, Money, cart_items::CartItem};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub unit_becoin: Money,
    pub unit_weight: Grams,
    pub recycled: bool,
}

impl OrderItem {
    /// Freezes a cart item into an order item.
    #[must_use]
    pub fn freeze(order_id: Uuid, item: &CartItem) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            unit_becoin: item.unit_becoin,
            unit_weight: item.unit_weight,
            recycled: item.recycled,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub order_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_minor: i64,
    pub unit_becoin_minor: i64,
    pub unit_weight_grams: i64,
    pub recycled: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Orders,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&OrderItem> for ActiveModel {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: ActiveValue::Set(item.id.to_string()),
            order_id: ActiveValue::Set(item.order_id.to_string()),
            name: ActiveValue::Set(item.name.clone()),
            quantity: ActiveValue::Set(item.quantity),
            unit_price_minor: ActiveValue::Set(item.unit_price.minor()),
            unit_becoin_minor: ActiveValue::Set(item.unit_becoin.minor()),
            unit_weight_grams: ActiveValue::Set(item.unit_weight.grams()),
            recycled: ActiveValue::Set(item.recycled),
        }
    }
}

impl TryFrom<Model> for OrderItem {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("order item not exists".to_string()))?,
            order_id: Uuid::parse_str(&model.order_id)
                .map_err(|_| EngineError::KeyNotFound("order not exists".to_string()))?,
            name: model.name,
            quantity: model.quantity,
            unit_price: Money::new(model.unit_price_minor),
            unit_becoin: Money::new(model.unit_becoin_minor),
            unit_weight: Grams::new(model.unit_weight_grams),
            recycled: model.recycled,
        })
    }
}

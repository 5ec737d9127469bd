//! Cart line items.

use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Grams, Money};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub unit_becoin: Money,
    pub unit_weight: Grams,
    /// Recycled-material line; contributes to the cart's
    /// `total_weight_recycled`.
    pub recycled: bool,
}

impl CartItem {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cart_id: Uuid,
        name: String,
        quantity: i64,
        unit_price: Money,
        unit_becoin: Money,
        unit_weight: Grams,
        recycled: bool,
    ) -> Result<Self, EngineError> {
        if quantity <= 0 {
            return Err(EngineError::InvalidAmount(
                "quantity must be > 0".to_string(),
            ));
        }
        if unit_price.is_negative() || unit_becoin.is_negative() {
            return Err(EngineError::InvalidAmount(
                "unit prices must not be negative".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            cart_id,
            name,
            quantity,
            unit_price,
            unit_becoin,
            unit_weight,
            recycled,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cart_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub cart_id: String,
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
        belongs_to = "super::carts::Entity",
        from = "Column::CartId",
        to = "super::carts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Carts,
}

impl Related<super::carts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Carts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CartItem> for ActiveModel {
    fn from(item: &CartItem) -> Self {
        Self {
            id: ActiveValue::Set(item.id.to_string()),
            cart_id: ActiveValue::Set(item.cart_id.to_string()),
            name: ActiveValue::Set(item.name.clone()),
            quantity: ActiveValue::Set(item.quantity),
            unit_price_minor: ActiveValue::Set(item.unit_price.minor()),
            unit_becoin_minor: ActiveValue::Set(item.unit_becoin.minor()),
            unit_weight_grams: ActiveValue::Set(item.unit_weight.grams()),
            recycled: ActiveValue::Set(item.recycled),
        }
    }
}

impl TryFrom<Model> for CartItem {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("cart item not exists".to_string()))?,
            cart_id: Uuid::parse_str(&model.cart_id)
                .map_err(|_| EngineError::KeyNotFound("cart not exists".to_string()))?,
            name: model.name,
            quantity: model.quantity,
            unit_price: Money::new(model.unit_price_minor),
            unit_becoin: Money::new(model.unit_becoin_minor),
            unit_weight: Grams::new(model.unit_weight_grams),
            recycled: model.recycled,
        })
    }
}

//! Delivery status lookup table (seeded by migration).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "delivery_statuses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    pub description: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const CREATED: &str = "CREATED";
pub const AWAITING_PAYMENT: &str = "AWAITING_PAYMENT";
pub const PREPARING: &str = "PREPARING";
pub const SHIPPED: &str = "SHIPPED";
pub const DELIVERED: &str = "DELIVERED";
pub const CANCELLED: &str = "CANCELLED";

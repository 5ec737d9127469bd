//! Payment type lookup table (seeded by migration).
//!
//! `is_becoin` marks the payment types that settle immediately against
//! the wallet; everything else goes through the external pending-payment
//! path.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payment_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    pub description: String,
    pub is_becoin: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const BECOIN: &str = "BECOIN";
pub const CASH: &str = "CASH";
pub const CARD: &str = "CARD";

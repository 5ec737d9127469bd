//! Users table (minimal entity).
//!
//! The engine stores ownership by `user_id`, which is the username.
//! Authentication lives in the server; the engine only trusts the
//! identity it is handed.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub role_name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Role that unlocks administrative supply operations.
pub const ROLE_ADMIN: &str = "admin";
/// Default role for everyone else.
pub const ROLE_MEMBER: &str = "member";

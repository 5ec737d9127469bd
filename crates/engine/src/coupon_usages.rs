//! Coupon redemptions: one row per confirmed use of a coupon by a user.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Money};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CouponUsage {
    pub id: Uuid,
    pub coupon_id: Uuid,
    pub user_id: String,
    /// Absent for `BONUS_COINS` redemptions outside a checkout.
    pub order_id: Option<Uuid>,
    pub original_amount: Money,
    pub discount_amount: Money,
    pub created_at: DateTime<Utc>,
}

impl CouponUsage {
    pub fn new(
        coupon_id: Uuid,
        user_id: String,
        original_amount: Money,
        discount_amount: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            coupon_id,
            user_id,
            order_id: None,
            original_amount,
            discount_amount,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "coupon_usages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub coupon_id: String,
    pub user_id: String,
    pub order_id: Option<String>,
    pub original_amount_minor: i64,
    pub discount_amount_minor: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::coupons::Entity",
        from = "Column::CouponId",
        to = "super::coupons::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Coupons,
}

impl Related<super::coupons::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Coupons.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CouponUsage> for ActiveModel {
    fn from(usage: &CouponUsage) -> Self {
        Self {
            id: ActiveValue::Set(usage.id.to_string()),
            coupon_id: ActiveValue::Set(usage.coupon_id.to_string()),
            user_id: ActiveValue::Set(usage.user_id.clone()),
            order_id: ActiveValue::Set(usage.order_id.map(|id| id.to_string())),
            original_amount_minor: ActiveValue::Set(usage.original_amount.minor()),
            discount_amount_minor: ActiveValue::Set(usage.discount_amount.minor()),
            created_at: ActiveValue::Set(usage.created_at),
        }
    }
}

impl TryFrom<Model> for CouponUsage {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("coupon usage not exists".to_string()))?,
            coupon_id: Uuid::parse_str(&model.coupon_id)
                .map_err(|_| EngineError::KeyNotFound("coupon not exists".to_string()))?,
            user_id: model.user_id,
            order_id: model.order_id.and_then(|s| Uuid::parse_str(&s).ok()),
            original_amount: Money::new(model.original_amount_minor),
            discount_amount: Money::new(model.discount_amount_minor),
            created_at: model.created_at,
        })
    }
}

//! Coupons.
//!
//! A coupon is either a `DISCOUNT` (reduces the amount charged at
//! checkout) or `BONUS_COINS` (credits becoin directly on redemption).
//! The discount math is pure; all persistence happens in the engine ops.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CouponKind {
    Discount,
    BonusCoins,
}

impl CouponKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discount => "DISCOUNT",
            Self::BonusCoins => "BONUS_COINS",
        }
    }
}

impl TryFrom<&str> for CouponKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "DISCOUNT" => Ok(Self::Discount),
            "BONUS_COINS" => Ok(Self::BonusCoins),
            other => Err(EngineError::InvalidState(format!(
                "invalid coupon kind: {other}"
            ))),
        }
    }
}

/// How `value` is interpreted for `DISCOUNT` coupons: a flat amount in
/// minor units, or a whole percentage (0–100) of the purchase total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CouponValueKind {
    Flat,
    Percent,
}

impl CouponValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "FLAT",
            Self::Percent => "PERCENT",
        }
    }
}

impl TryFrom<&str> for CouponValueKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "FLAT" => Ok(Self::Flat),
            "PERCENT" => Ok(Self::Percent),
            other => Err(EngineError::InvalidState(format!(
                "invalid coupon value kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coupon {
    pub id: Uuid,
    /// Normalized (NFKC, trimmed, uppercased) redemption code.
    pub code: String,
    pub kind: CouponKind,
    pub value_kind: CouponValueKind,
    /// Flat minor units, or percent 0–100, per `value_kind`.
    pub value: i64,
    pub max_discount: Option<Money>,
    pub min_spend: Money,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_usage_count: Option<i64>,
    pub usage_limit_per_user: Option<i64>,
    pub is_active: bool,
}

impl Coupon {
    /// Computes the discount this coupon grants against `purchase_total`.
    ///
    /// The result never exceeds the purchase total nor the optional
    /// `max_discount` cap. `BONUS_COINS` coupons grant no discount.
    #[must_use]
    pub fn discount_for(&self, purchase_total: Money) -> Money {
        if self.kind != CouponKind::Discount {
            return Money::ZERO;
        }

        let raw = match self.value_kind {
            CouponValueKind::Flat => Money::new(self.value),
            // Integer math: minor units * percent / 100 stays exact.
            CouponValueKind::Percent => {
                Money::new(purchase_total.minor().saturating_mul(self.value) / 100)
            }
        };

        let mut discount = raw.min(purchase_total);
        if let Some(cap) = self.max_discount {
            discount = discount.min(cap);
        }
        discount.max(Money::ZERO)
    }

    /// Becoin granted on redemption of a `BONUS_COINS` coupon.
    #[must_use]
    pub fn bonus_amount(&self) -> Money {
        match self.kind {
            CouponKind::BonusCoins => Money::new(self.value),
            CouponKind::Discount => Money::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub code: String,
    pub kind: String,
    pub value_kind: String,
    pub value: i64,
    pub max_discount_minor: Option<i64>,
    pub min_spend_minor: i64,
    pub expires_at: Option<DateTimeUtc>,
    pub max_usage_count: Option<i64>,
    pub usage_limit_per_user: Option<i64>,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::coupon_usages::Entity")]
    CouponUsages,
}

impl Related<super::coupon_usages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CouponUsages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Coupon> for ActiveModel {
    fn from(coupon: &Coupon) -> Self {
        Self {
            id: ActiveValue::Set(coupon.id.to_string()),
            code: ActiveValue::Set(coupon.code.clone()),
            kind: ActiveValue::Set(coupon.kind.as_str().to_string()),
            value_kind: ActiveValue::Set(coupon.value_kind.as_str().to_string()),
            value: ActiveValue::Set(coupon.value),
            max_discount_minor: ActiveValue::Set(coupon.max_discount.map(Money::minor)),
            min_spend_minor: ActiveValue::Set(coupon.min_spend.minor()),
            expires_at: ActiveValue::Set(coupon.expires_at),
            max_usage_count: ActiveValue::Set(coupon.max_usage_count),
            usage_limit_per_user: ActiveValue::Set(coupon.usage_limit_per_user),
            is_active: ActiveValue::Set(coupon.is_active),
        }
    }
}

impl TryFrom<Model> for Coupon {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("coupon not exists".to_string()))?,
            code: model.code,
            kind: CouponKind::try_from(model.kind.as_str())?,
            value_kind: CouponValueKind::try_from(model.value_kind.as_str())?,
            value: model.value,
            max_discount: model.max_discount_minor.map(Money::new),
            min_spend: Money::new(model.min_spend_minor),
            expires_at: model.expires_at,
            max_usage_count: model.max_usage_count,
            usage_limit_per_user: model.usage_limit_per_user,
            is_active: model.is_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coupon(kind: CouponKind, value_kind: CouponValueKind, value: i64) -> Coupon {
        Coupon {
            id: Uuid::new_v4(),
            code: "TEST".to_string(),
            kind,
            value_kind,
            value,
            max_discount: None,
            min_spend: Money::ZERO,
            expires_at: None,
            max_usage_count: None,
            usage_limit_per_user: None,
            is_active: true,
        }
    }

    #[test]
    fn flat_discount_is_capped_by_total() {
        let c = coupon(CouponKind::Discount, CouponValueKind::Flat, 500);
        assert_eq!(c.discount_for(Money::new(1000)), Money::new(500));
        assert_eq!(c.discount_for(Money::new(300)), Money::new(300));
    }

    #[test]
    fn percent_discount_uses_integer_math() {
        let c = coupon(CouponKind::Discount, CouponValueKind::Percent, 10);
        assert_eq!(c.discount_for(Money::new(2500)), Money::new(250));
        assert_eq!(c.discount_for(Money::new(99)), Money::new(9));
    }

    #[test]
    fn max_discount_cap_applies() {
        let mut c = coupon(CouponKind::Discount, CouponValueKind::Percent, 50);
        c.max_discount = Some(Money::new(200));
        assert_eq!(c.discount_for(Money::new(1000)), Money::new(200));
    }

    #[test]
    fn bonus_coupons_grant_no_discount() {
        let c = coupon(CouponKind::BonusCoins, CouponValueKind::Flat, 500);
        assert_eq!(c.discount_for(Money::new(1000)), Money::ZERO);
        assert_eq!(c.bonus_amount(), Money::new(500));
    }
}

//! Coupon engine.
//!
//! Validation and discount math are pure; the only persistence done
//! here is the `coupon_usages` row on confirmed application, plus the
//! wallet credit for `BONUS_COINS` coupons — both inside one unit of
//! work, so a failed credit never leaves an orphan usage row.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, PaginatorTrait, QueryFilter, TransactionTrait,
    prelude::*,
};

use crate::{
    BalanceChange, BalanceKind, Coupon, CouponKind, CouponUsage, Direction, EngineError, Money,
    ResultEngine, Transaction, Wallet, coupon_usages, coupons, registry::codes, registry::states,
};

use super::{Attempt, Engine, normalize_coupon_code, with_tx};

impl Engine {
    pub(super) async fn coupon_by_code(
        &self,
        db_tx: &DatabaseTransaction,
        code: &str,
    ) -> ResultEngine<Coupon> {
        let model = coupons::Entity::find()
            .filter(coupons::Column::Code.eq(code.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("coupon not exists".to_string()))?;
        Coupon::try_from(model)
    }

    /// Validates `coupon` against a purchase context.
    ///
    /// Usage counts are read inside the caller's DB transaction so the
    /// caps hold up against the row the caller is about to insert.
    pub(super) async fn check_coupon(
        &self,
        db_tx: &DatabaseTransaction,
        coupon: &Coupon,
        user_id: &str,
        purchase_total: Money,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        if !coupon.is_active {
            return Err(EngineError::CouponInactive(coupon.code.clone()));
        }
        if let Some(expires_at) = coupon.expires_at
            && now > expires_at
        {
            return Err(EngineError::CouponExpired(coupon.code.clone()));
        }
        if purchase_total < coupon.min_spend {
            return Err(EngineError::MinSpendNotMet(format!(
                "{}: spend {purchase_total}, minimum {}",
                coupon.code, coupon.min_spend
            )));
        }

        if let Some(max_usage_count) = coupon.max_usage_count {
            let used = coupon_usages::Entity::find()
                .filter(coupon_usages::Column::CouponId.eq(coupon.id.to_string()))
                .count(db_tx)
                .await? as i64;
            if used >= max_usage_count {
                return Err(EngineError::UsageLimitExceeded(coupon.code.clone()));
            }
        }
        if let Some(per_user) = coupon.usage_limit_per_user {
            let used = coupon_usages::Entity::find()
                .filter(coupon_usages::Column::CouponId.eq(coupon.id.to_string()))
                .filter(coupon_usages::Column::UserId.eq(user_id.to_string()))
                .count(db_tx)
                .await? as i64;
            if used >= per_user {
                return Err(EngineError::UsageLimitExceeded(format!(
                    "{} for user {user_id}",
                    coupon.code
                )));
            }
        }

        Ok(())
    }

    /// Preview a coupon against a purchase total without persisting
    /// anything. Returns the discount it would grant.
    pub async fn validate_coupon(
        &self,
        code: &str,
        user_id: &str,
        purchase_total: Money,
    ) -> ResultEngine<Money> {
        let code = normalize_coupon_code(code)?;
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            let coupon = self.coupon_by_code(&db_tx, &code).await?;
            self.check_coupon(&db_tx, &coupon, user_id, purchase_total, now)
                .await?;
            Ok(coupon.discount_for(purchase_total))
        })
    }

    /// Redeem a `BONUS_COINS` coupon: record the usage and credit the
    /// user's wallet in one unit of work.
    pub async fn redeem_bonus_coupon(&self, code: &str, user_id: &str) -> ResultEngine<Wallet> {
        let code = normalize_coupon_code(code)?;
        self.registry().require_type(codes::BONUS)?;
        let now = Utc::now();

        let (wallet, bonus) = self
            .retry_on_conflict("redeem_bonus_coupon", |db_tx| {
                let code = &code;
                Box::pin(async move {
                    let coupon = self.coupon_by_code(db_tx, code).await?;
                    if coupon.kind != CouponKind::BonusCoins {
                        return Err(EngineError::InvalidState(
                            "coupon does not grant bonus coins".to_string(),
                        ));
                    }
                    self.check_coupon(db_tx, &coupon, user_id, Money::ZERO, now)
                        .await?;

                    let bonus = coupon.bonus_amount();
                    if !bonus.is_positive() {
                        return Err(EngineError::InvalidAmount(
                            "coupon grants no coins".to_string(),
                        ));
                    }

                    let wallet_model = self.require_wallet_of_user(db_tx, user_id).await?;
                    let (new_becoin, new_green) = match self
                        .apply_delta_in_tx(
                            db_tx,
                            &wallet_model,
                            BalanceKind::Becoin,
                            Direction::Credit,
                            bonus,
                        )
                        .await?
                    {
                        Attempt::Done(balances) => balances,
                        Attempt::Conflict => return Ok(Attempt::Conflict),
                    };

                    let mut wallet = Wallet::try_from(wallet_model)?;

                    let mut tx = Transaction::new(
                        wallet.id,
                        codes::BONUS.to_string(),
                        states::COMPLETED.to_string(),
                        BalanceKind::Becoin,
                        Direction::Credit,
                        bonus,
                        user_id.to_string(),
                        now,
                    )?;
                    tx.note = Some(format!("coupon {}", coupon.code));
                    self.insert_transaction(db_tx, &tx).await?;

                    let usage =
                        CouponUsage::new(coupon.id, user_id.to_string(), Money::ZERO, bonus, now);
                    coupon_usages::ActiveModel::from(&usage).insert(db_tx).await?;

                    wallet.becoin = new_becoin;
                    wallet.becoin_green = new_green;
                    wallet.version += 1;
                    Ok(Attempt::Done((wallet, bonus)))
                })
            })
            .await?;

        self.notify(
            &wallet.user_id,
            BalanceChange {
                wallet_id: wallet.id,
                becoin_minor: wallet.becoin.minor(),
                becoin_green_minor: wallet.becoin_green.minor(),
                message: format!("BONUS: +{bonus} becoin"),
                success: true,
                cleared_transaction_id: None,
            },
        );
        Ok(wallet)
    }

    /// Create a coupon. Administrative entry point; the capability check
    /// lives with the caller.
    pub async fn new_coupon(&self, coupon: Coupon) -> ResultEngine<Coupon> {
        let mut coupon = coupon;
        coupon.code = normalize_coupon_code(&coupon.code)?;
        if coupon.value <= 0 {
            return Err(EngineError::InvalidAmount(
                "coupon value must be > 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let exists = coupons::Entity::find()
                .filter(coupons::Column::Code.eq(coupon.code.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(coupon.code.clone()));
            }

            coupons::ActiveModel::from(&coupon).insert(&db_tx).await?;
            Ok(coupon.clone())
        })
    }
}

use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    AddCartItemCmd, CheckoutCmd, Coupon, CouponKind, CouponValueKind, CreditCmd, Engine,
    EngineError, Money, payment_types,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for username in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password, role_name) VALUES (?, ?, ?)",
            vec![username.into(), "password".into(), "member".into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn coupon(code: &str, kind: CouponKind, value: i64) -> Coupon {
    Coupon {
        id: Uuid::new_v4(),
        code: code.to_string(),
        kind,
        value_kind: CouponValueKind::Flat,
        value,
        max_discount: None,
        min_spend: Money::ZERO,
        expires_at: None,
        max_usage_count: None,
        usage_limit_per_user: None,
        is_active: true,
    }
}

#[tokio::test]
async fn expired_inactive_and_min_spend_checks() {
    let (engine, _db) = engine_with_db().await;

    let mut expired = coupon("EXPIRED", CouponKind::Discount, 100);
    expired.expires_at = Some(Utc::now() - Duration::days(1));
    engine.new_coupon(expired).await.unwrap();
    assert_eq!(
        engine
            .validate_coupon("EXPIRED", "alice", Money::new(1_000))
            .await
            .unwrap_err(),
        EngineError::CouponExpired("EXPIRED".to_string())
    );

    let mut inactive = coupon("INACTIVE", CouponKind::Discount, 100);
    inactive.is_active = false;
    engine.new_coupon(inactive).await.unwrap();
    assert_eq!(
        engine
            .validate_coupon("INACTIVE", "alice", Money::new(1_000))
            .await
            .unwrap_err(),
        EngineError::CouponInactive("INACTIVE".to_string())
    );

    let mut min_spend = coupon("BIGSPENDER", CouponKind::Discount, 100);
    min_spend.min_spend = Money::new(5_000);
    engine.new_coupon(min_spend).await.unwrap();
    let err = engine
        .validate_coupon("BIGSPENDER", "alice", Money::new(1_000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::MinSpendNotMet(_)));

    // Codes are normalized before lookup.
    let discount = engine
        .validate_coupon("  bigspender ", "alice", Money::new(6_000))
        .await
        .unwrap();
    assert_eq!(discount, Money::new(100));
}

#[tokio::test]
async fn per_user_usage_cap_is_enforced() {
    let (engine, _db) = engine_with_db().await;
    engine.new_wallet("alice").await.unwrap();
    engine.new_wallet("bob").await.unwrap();

    let mut bonus = coupon("WELCOME", CouponKind::BonusCoins, 500);
    bonus.usage_limit_per_user = Some(1);
    engine.new_coupon(bonus).await.unwrap();

    let wallet = engine.redeem_bonus_coupon("WELCOME", "alice").await.unwrap();
    assert_eq!(wallet.becoin, Money::new(500));

    let err = engine
        .redeem_bonus_coupon("WELCOME", "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UsageLimitExceeded(_)));

    // The first redemption is untouched and another user may still
    // redeem.
    let wallet = engine.wallet("alice").await.unwrap();
    assert_eq!(wallet.becoin, Money::new(500));
    let wallet = engine.redeem_bonus_coupon("WELCOME", "bob").await.unwrap();
    assert_eq!(wallet.becoin, Money::new(500));
}

#[tokio::test]
async fn global_usage_cap_is_enforced() {
    let (engine, _db) = engine_with_db().await;
    engine.new_wallet("alice").await.unwrap();
    engine.new_wallet("bob").await.unwrap();

    let mut bonus = coupon("SCARCE", CouponKind::BonusCoins, 100);
    bonus.max_usage_count = Some(1);
    engine.new_coupon(bonus).await.unwrap();

    engine.redeem_bonus_coupon("SCARCE", "alice").await.unwrap();
    let err = engine
        .redeem_bonus_coupon("SCARCE", "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UsageLimitExceeded(_)));
}

#[tokio::test]
async fn bonus_redemption_without_wallet_leaves_no_usage_row() {
    let (engine, _db) = engine_with_db().await;

    let mut bonus = coupon("NOWALLET", CouponKind::BonusCoins, 100);
    bonus.usage_limit_per_user = Some(1);
    engine.new_coupon(bonus).await.unwrap();

    // No wallet yet: the credit fails, so no usage may be recorded.
    let err = engine
        .redeem_bonus_coupon("NOWALLET", "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::WalletNotFound(_)));

    // After creating the wallet the same coupon still redeems: the
    // failed attempt did not consume the per-user cap.
    engine.new_wallet("alice").await.unwrap();
    let wallet = engine
        .redeem_bonus_coupon("NOWALLET", "alice")
        .await
        .unwrap();
    assert_eq!(wallet.becoin, Money::new(100));
}

#[tokio::test]
async fn discount_coupon_reduces_checkout_charge() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine.new_wallet("alice").await.unwrap();
    engine
        .credit(CreditCmd::new(wallet.id, Money::new(10_000), "alice"))
        .await
        .unwrap();

    let mut percent = coupon("TEN", CouponKind::Discount, 10);
    percent.value_kind = CouponValueKind::Percent;
    engine.new_coupon(percent).await.unwrap();

    engine
        .add_cart_item(AddCartItemCmd::new("alice", "Item", 1).unit_becoin(Money::new(2_000)))
        .await
        .unwrap();

    let order = engine
        .checkout(CheckoutCmd::new("alice", payment_types::BECOIN).coupon_code("TEN"))
        .await
        .unwrap();
    assert_eq!(order.discount, Money::new(200));

    let wallet = engine.wallet("alice").await.unwrap();
    assert_eq!(wallet.becoin, Money::new(10_000 - 1_800));
}

#[tokio::test]
async fn bonus_coupon_cannot_discount_a_checkout() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine.new_wallet("alice").await.unwrap();
    engine
        .credit(CreditCmd::new(wallet.id, Money::new(1_000), "alice"))
        .await
        .unwrap();

    engine.new_coupon(coupon("COINS", CouponKind::BonusCoins, 500)).await.unwrap();
    engine
        .add_cart_item(AddCartItemCmd::new("alice", "Item", 1).unit_becoin(Money::new(100)))
        .await
        .unwrap();

    let err = engine
        .checkout(CheckoutCmd::new("alice", payment_types::BECOIN).coupon_code("COINS"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn discount_redemption_is_recorded_once_per_checkout() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine.new_wallet("alice").await.unwrap();
    engine
        .credit(CreditCmd::new(wallet.id, Money::new(10_000), "alice"))
        .await
        .unwrap();

    let mut once = coupon("ONCE", CouponKind::Discount, 100);
    once.usage_limit_per_user = Some(1);
    engine.new_coupon(once).await.unwrap();

    engine
        .add_cart_item(AddCartItemCmd::new("alice", "Item", 1).unit_becoin(Money::new(1_000)))
        .await
        .unwrap();
    engine
        .checkout(CheckoutCmd::new("alice", payment_types::BECOIN).coupon_code("ONCE"))
        .await
        .unwrap();

    engine
        .add_cart_item(AddCartItemCmd::new("alice", "Item", 1).unit_becoin(Money::new(1_000)))
        .await
        .unwrap();
    let err = engine
        .checkout(CheckoutCmd::new("alice", payment_types::BECOIN).coupon_code("ONCE"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UsageLimitExceeded(_)));

    // The failed checkout left the cart intact.
    let (_, items) = engine.cart("alice").await.unwrap();
    assert_eq!(items.len(), 1);
}

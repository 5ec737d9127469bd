use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AddCartItemCmd, CheckoutCmd, CreditCmd, Engine, EngineError, Grams, Money, codes,
    delivery_statuses, payment_types, states,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password, role_name) VALUES (?, ?, ?)",
        vec!["alice".into(), "password".into(), "member".into()],
    ))
    .await
    .unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

#[tokio::test]
async fn item_mutations_recompute_totals() {
    let (engine, _db) = engine_with_db().await;
    engine.new_wallet("alice").await.unwrap();

    let (cart, item) = engine
        .add_cart_item(
            AddCartItemCmd::new("alice", "Bottle crate", 2)
                .unit_price(Money::new(1_000))
                .unit_becoin(Money::new(500))
                .unit_weight(Grams::new(300))
                .recycled(true),
        )
        .await
        .unwrap();
    assert_eq!(cart.totals.amount, Money::new(2_000));
    assert_eq!(cart.totals.items, 2);
    assert_eq!(cart.totals.weight_recycled, Grams::new(600));

    let cart = engine
        .update_cart_item_quantity("alice", item.id, 5)
        .await
        .unwrap();
    assert_eq!(cart.totals.amount, Money::new(5_000));
    assert_eq!(cart.totals.items, 5);
    assert_eq!(cart.totals.becoin, Money::new(2_500));

    let cart = engine.remove_cart_item("alice", item.id).await.unwrap();
    assert_eq!(cart.totals.amount, Money::ZERO);
    assert_eq!(cart.totals.items, 0);
    assert_eq!(cart.totals.weight, Grams::ZERO);
}

#[tokio::test]
async fn checkout_freezes_order_debits_wallet_and_clears_cart() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine.new_wallet("alice").await.unwrap();
    engine
        .credit(CreditCmd::new(wallet.id, Money::new(10_000), "alice"))
        .await
        .unwrap();

    engine
        .add_cart_item(
            AddCartItemCmd::new("alice", "Compost bin", 2)
                .unit_price(Money::new(1_000))
                .unit_becoin(Money::new(1_000)),
        )
        .await
        .unwrap();
    engine
        .add_cart_item(
            AddCartItemCmd::new("alice", "Seed pack", 1)
                .unit_price(Money::new(500))
                .unit_becoin(Money::new(500)),
        )
        .await
        .unwrap();

    let order = engine
        .checkout(CheckoutCmd::new("alice", payment_types::BECOIN))
        .await
        .unwrap();

    assert_eq!(order.code, "ORD-000001");
    assert_eq!(order.totals.amount, Money::new(2_500));
    assert_eq!(order.totals.becoin, Money::new(2_500));
    assert_eq!(order.status_code, delivery_statuses::PREPARING);

    // The frozen order items match the cart at settlement time.
    let (_, items) = engine.order(order.id, "alice").await.unwrap();
    assert_eq!(items.len(), 2);
    let frozen_total: i64 = items
        .iter()
        .map(|item| item.unit_becoin.minor() * item.quantity)
        .sum();
    assert_eq!(frozen_total, order.totals.becoin.minor());

    // Wallet debited by the becoin total.
    let wallet = engine.wallet("alice").await.unwrap();
    assert_eq!(wallet.becoin, Money::new(7_500));

    // Cart is cleared, not deleted: same cart id, zero totals, no items.
    let (cart, items) = engine.cart("alice").await.unwrap();
    assert_eq!(cart.totals.amount, Money::ZERO);
    assert_eq!(cart.totals.items, 0);
    assert!(items.is_empty());

    // The purchase shows up as a completed transaction on the ledger.
    let (txs, _) = engine
        .list_transactions(wallet.id, "alice", 10, None, &Default::default())
        .await
        .unwrap();
    let purchase = txs.iter().find(|tx| tx.type_code == codes::PURCHASE).unwrap();
    assert_eq!(purchase.state_code, states::COMPLETED);
    assert_eq!(purchase.order_id, Some(order.id));
}

#[tokio::test]
async fn empty_cart_cannot_check_out() {
    let (engine, _db) = engine_with_db().await;
    engine.new_wallet("alice").await.unwrap();

    let err = engine
        .checkout(CheckoutCmd::new("alice", payment_types::BECOIN))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::CartEmpty);
}

#[tokio::test]
async fn unknown_payment_type_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    engine.new_wallet("alice").await.unwrap();
    engine
        .add_cart_item(AddCartItemCmd::new("alice", "Item", 1).unit_becoin(Money::new(100)))
        .await
        .unwrap();

    let err = engine
        .checkout(CheckoutCmd::new("alice", "BARTER"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidPaymentType("BARTER".to_string()));
}

#[tokio::test]
async fn failed_debit_keeps_cart_and_creates_no_order() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine.new_wallet("alice").await.unwrap();
    engine
        .credit(CreditCmd::new(wallet.id, Money::new(100), "alice"))
        .await
        .unwrap();

    engine
        .add_cart_item(
            AddCartItemCmd::new("alice", "Expensive", 1).unit_becoin(Money::new(999_999)),
        )
        .await
        .unwrap();

    let err = engine
        .checkout(CheckoutCmd::new("alice", payment_types::BECOIN))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    let wallet = engine.wallet("alice").await.unwrap();
    assert_eq!(wallet.becoin, Money::new(100));

    let (cart, items) = engine.cart("alice").await.unwrap();
    assert_eq!(items.len(), 1, "cart must stay intact");
    assert_eq!(cart.totals.becoin, Money::new(999_999));

    assert!(engine.list_orders("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn external_payment_parks_order_until_gateway_result() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine.new_wallet("alice").await.unwrap();

    engine
        .add_cart_item(
            AddCartItemCmd::new("alice", "Basket", 1)
                .unit_price(Money::new(3_000))
                .unit_becoin(Money::new(100)),
        )
        .await
        .unwrap();

    let order = engine
        .checkout(CheckoutCmd::new("alice", payment_types::CARD))
        .await
        .unwrap();
    assert_eq!(order.status_code, delivery_statuses::AWAITING_PAYMENT);

    // No balance movement while the payment is pending.
    let wallet = engine.wallet("alice").await.unwrap();
    assert_eq!(wallet.becoin, Money::ZERO);
    let (txs, _) = engine
        .list_transactions(wallet.id, "alice", 10, None, &Default::default())
        .await
        .unwrap();
    assert_eq!(txs[0].state_code, states::PENDING);

    let order = engine
        .record_payment_result(order.id, true, Some("psp-12345"))
        .await
        .unwrap();
    assert_eq!(order.status_code, delivery_statuses::PREPARING);
    assert!(order.observation.unwrap().contains("psp-12345"));

    let (txs, _) = engine
        .list_transactions(wallet.id, "alice", 10, None, &Default::default())
        .await
        .unwrap();
    assert_eq!(txs[0].state_code, states::COMPLETED);

    // Terminal transactions cannot be finalized twice.
    let err = engine
        .record_payment_result(order.id, true, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn failed_gateway_result_cancels_the_order() {
    let (engine, _db) = engine_with_db().await;
    engine.new_wallet("alice").await.unwrap();

    engine
        .add_cart_item(AddCartItemCmd::new("alice", "Basket", 1).unit_price(Money::new(3_000)))
        .await
        .unwrap();

    let order = engine
        .checkout(CheckoutCmd::new("alice", payment_types::CASH))
        .await
        .unwrap();

    let order = engine
        .record_payment_result(order.id, false, None)
        .await
        .unwrap();
    assert_eq!(order.status_code, delivery_statuses::CANCELLED);

    let wallet = engine.wallet("alice").await.unwrap();
    let (txs, _) = engine
        .list_transactions(wallet.id, "alice", 10, None, &Default::default())
        .await
        .unwrap();
    assert_eq!(txs[0].state_code, states::FAILED);
}

#[tokio::test]
async fn order_codes_are_sequential() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine.new_wallet("alice").await.unwrap();
    engine
        .credit(CreditCmd::new(wallet.id, Money::new(10_000), "alice"))
        .await
        .unwrap();

    for expected in ["ORD-000001", "ORD-000002", "ORD-000003"] {
        engine
            .add_cart_item(AddCartItemCmd::new("alice", "Item", 1).unit_becoin(Money::new(100)))
            .await
            .unwrap();
        let order = engine
            .checkout(CheckoutCmd::new("alice", payment_types::BECOIN))
            .await
            .unwrap();
        assert_eq!(order.code, expected);
    }
}

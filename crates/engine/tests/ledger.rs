use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AdminMintCmd, AdminOperation, BalanceKind, BroadcastNotifier, CreditCmd, DebitCmd, Engine,
    EngineError, Money, RetryPolicy, TransferCmd, codes,
};
use migration::MigratorTrait;

async fn db_with_users(usernames: &[&str]) -> DatabaseConnection {
    connect_with_users("sqlite::memory:", usernames).await
}

/// File-backed database for tests that hammer the pool from several
/// tasks at once.
async fn file_db_with_users(usernames: &[&str]) -> (DatabaseConnection, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("ledger_{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());
    let db = connect_with_users(&url, usernames).await;
    (db, path)
}

async fn connect_with_users(url: &str, usernames: &[&str]) -> DatabaseConnection {
    let db = Database::connect(url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for username in usernames {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password, role_name) VALUES (?, ?, ?)",
            vec![(*username).into(), "password".into(), "member".into()],
        ))
        .await
        .unwrap();
    }
    db
}

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = db_with_users(&["alice", "bob"]).await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

#[tokio::test]
async fn debit_decreases_balance_and_records_one_transaction() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine.new_wallet("alice").await.unwrap();

    engine
        .credit(CreditCmd::new(wallet.id, Money::new(10_000), "alice"))
        .await
        .unwrap();

    let (wallet, tx) = engine
        .debit(
            DebitCmd::new(wallet.id, Money::new(3_000), "alice").type_code(codes::PURCHASE),
        )
        .await
        .unwrap();

    assert_eq!(wallet.becoin, Money::new(7_000));
    assert_eq!(tx.type_code, codes::PURCHASE);
    assert_eq!(tx.amount, Money::new(3_000));

    let (txs, _) = engine
        .list_transactions(wallet.id, "alice", 10, None, &Default::default())
        .await
        .unwrap();
    assert_eq!(txs.len(), 2);

    let fetched = engine.transaction(tx.id, "alice").await.unwrap();
    assert_eq!(fetched.amount, tx.amount);

    // Each call is a distinct economic event; the same debit succeeds
    // again.
    let (wallet, _) = engine
        .debit(
            DebitCmd::new(wallet.id, Money::new(3_000), "alice").type_code(codes::PURCHASE),
        )
        .await
        .unwrap();
    assert_eq!(wallet.becoin, Money::new(4_000));
}

#[tokio::test]
async fn overdraft_fails_and_leaves_balance_unchanged() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine.new_wallet("alice").await.unwrap();

    engine
        .credit(CreditCmd::new(wallet.id, Money::new(500), "alice"))
        .await
        .unwrap();

    let err = engine
        .debit(DebitCmd::new(wallet.id, Money::new(501), "alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    let wallet = engine.wallet("alice").await.unwrap();
    assert_eq!(wallet.becoin, Money::new(500));

    let (txs, _) = engine
        .list_transactions(wallet.id, "alice", 10, None, &Default::default())
        .await
        .unwrap();
    assert_eq!(txs.len(), 1, "failed debit must not leave an orphan row");
}

#[tokio::test]
async fn unknown_type_code_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine.new_wallet("alice").await.unwrap();

    let err = engine
        .credit(CreditCmd::new(wallet.id, Money::new(100), "alice").type_code("AIRDROP"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::TransactionTypeUnknown("AIRDROP".to_string())
    );

    // The seeded registry drives validation, not a hardcoded enum.
    assert!(engine
        .transaction_type_codes()
        .contains(&codes::RECHARGE.to_string()));
    assert!(engine
        .transaction_state_codes()
        .contains(&"PENDING".to_string()));
}

#[tokio::test]
async fn wallets_are_only_readable_by_their_owner() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.new_wallet("alice").await.unwrap();

    let err = engine.wallet_by_id(alice.id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let wallet = engine.wallet_by_id(alice.id, "alice").await.unwrap();
    assert_eq!(wallet.id, alice.id);
}

#[tokio::test]
async fn missing_wallet_fails_with_wallet_not_found() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .credit(CreditCmd::new(uuid::Uuid::new_v4(), Money::new(100), "alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::WalletNotFound(_)));
}

#[tokio::test]
async fn transfer_moves_funds_and_links_counterparties() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.new_wallet("alice").await.unwrap();
    let bob = engine.new_wallet("bob").await.unwrap();

    engine
        .credit(CreditCmd::new(alice.id, Money::new(1_000), "alice"))
        .await
        .unwrap();

    let (from, to) = engine
        .transfer(TransferCmd::new(alice.id, bob.id, Money::new(400), "alice"))
        .await
        .unwrap();

    assert_eq!(from.becoin, Money::new(600));
    assert_eq!(to.becoin, Money::new(400));

    let (alice_txs, _) = engine
        .list_transactions(alice.id, "alice", 10, None, &Default::default())
        .await
        .unwrap();
    let transfer_out = alice_txs
        .iter()
        .find(|tx| tx.type_code == codes::TRANSFER)
        .unwrap();
    assert_eq!(transfer_out.related_wallet_id, Some(bob.id));

    let (bob_txs, _) = engine
        .list_transactions(bob.id, "bob", 10, None, &Default::default())
        .await
        .unwrap();
    assert_eq!(bob_txs[0].related_wallet_id, Some(alice.id));
}

#[tokio::test]
async fn failed_transfer_leg_rolls_back_both_wallets() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.new_wallet("alice").await.unwrap();

    engine
        .credit(CreditCmd::new(alice.id, Money::new(1_000), "alice"))
        .await
        .unwrap();

    // Credit leg fails: destination wallet does not exist.
    let err = engine
        .transfer(TransferCmd::new(
            alice.id,
            uuid::Uuid::new_v4(),
            Money::new(400),
            "alice",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::WalletNotFound(_)));

    let alice = engine.wallet("alice").await.unwrap();
    assert_eq!(alice.becoin, Money::new(1_000), "no single-legged transfer");

    let (txs, _) = engine
        .list_transactions(alice.id, "alice", 10, None, &Default::default())
        .await
        .unwrap();
    assert!(txs.iter().all(|tx| tx.type_code != codes::TRANSFER));
}

#[tokio::test]
async fn recycle_rewards_credit_the_green_balance() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine.new_wallet("alice").await.unwrap();

    let (wallet, tx) = engine
        .credit(
            CreditCmd::new(wallet.id, Money::new(750), "alice")
                .balance(BalanceKind::BecoinGreen)
                .type_code(codes::RECYCLE)
                .note("glass, 3kg"),
        )
        .await
        .unwrap();

    assert_eq!(wallet.becoin, Money::ZERO);
    assert_eq!(wallet.becoin_green, Money::new(750));
    assert_eq!(tx.type_code, codes::RECYCLE);

    // Green balance overdrafts are rejected like any other.
    let err = engine
        .debit(
            DebitCmd::new(wallet.id, Money::new(751), "alice")
                .balance(BalanceKind::BecoinGreen)
                .type_code(codes::RECYCLE),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
}

#[tokio::test]
async fn donation_is_a_typed_transfer() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.new_wallet("alice").await.unwrap();
    let bob = engine.new_wallet("bob").await.unwrap();

    engine
        .credit(CreditCmd::new(alice.id, Money::new(1_000), "alice"))
        .await
        .unwrap();

    engine
        .transfer(
            TransferCmd::new(alice.id, bob.id, Money::new(300), "alice")
                .type_code(codes::DONATION),
        )
        .await
        .unwrap();

    let (bob_txs, _) = engine
        .list_transactions(bob.id, "bob", 10, None, &Default::default())
        .await
        .unwrap();
    assert_eq!(bob_txs[0].type_code, codes::DONATION);
    assert_eq!(bob_txs[0].related_wallet_id, Some(alice.id));
}

#[tokio::test]
async fn transfer_to_self_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.new_wallet("alice").await.unwrap();

    let err = engine
        .transfer(TransferCmd::new(alice.id, alice.id, Money::new(1), "alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_debits_do_not_lose_updates() {
    const TASKS: usize = 4;
    const AMOUNT: i64 = 250;

    let (db, db_path) = file_db_with_users(&["alice"]).await;
    let engine = Engine::builder()
        .database(db.clone())
        .retry(RetryPolicy {
            max_attempts: 25,
            backoff: std::time::Duration::from_millis(5),
        })
        .build()
        .await
        .unwrap();
    let engine = Arc::new(engine);

    let wallet = engine.new_wallet("alice").await.unwrap();
    engine
        .credit(CreditCmd::new(
            wallet.id,
            Money::new(AMOUNT * TASKS as i64),
            "alice",
        ))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..TASKS {
        let engine = Arc::clone(&engine);
        let wallet_id = wallet.id;
        handles.push(tokio::spawn(async move {
            engine
                .debit(DebitCmd::new(wallet_id, Money::new(AMOUNT), "alice"))
                .await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let wallet = engine.wallet("alice").await.unwrap();
    assert_eq!(wallet.becoin, Money::ZERO, "no lost updates");

    let (txs, _) = engine
        .list_transactions(wallet.id, "alice", 20, None, &Default::default())
        .await
        .unwrap();
    // 1 credit + TASKS debits.
    assert_eq!(txs.len(), TASKS + 1);

    drop(engine);
    db.close().await.unwrap();
    let _ = std::fs::remove_file(db_path);
}

#[tokio::test]
async fn notifications_fire_only_for_committed_mutations() {
    let db = db_with_users(&["alice"]).await;
    let notifier = Arc::new(BroadcastNotifier::new(16));
    let mut rx = notifier.subscribe();

    let engine = Engine::builder()
        .database(db.clone())
        .notifier(notifier)
        .build()
        .await
        .unwrap();

    let wallet = engine.new_wallet("alice").await.unwrap();
    engine
        .credit(CreditCmd::new(wallet.id, Money::new(1_000), "alice"))
        .await
        .unwrap();

    let (user_id, change) = rx.try_recv().unwrap();
    assert_eq!(user_id, "alice");
    assert_eq!(change.becoin_minor, 1_000);
    assert!(change.success);

    // A rejected debit commits nothing and must stay silent.
    let _ = engine
        .debit(DebitCmd::new(wallet.id, Money::new(2_000), "alice"))
        .await
        .unwrap_err();
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn admin_mint_and_destroy_track_supply() {
    let db = db_with_users(&["treasury"]).await;

    let bootstrap = Engine::builder().database(db.clone()).build().await.unwrap();
    let system_wallet = bootstrap.ensure_wallet("treasury").await.unwrap();

    let engine = Engine::builder()
        .database(db.clone())
        .system_wallet(system_wallet.id)
        .build()
        .await
        .unwrap();

    let (wallet, record) = engine
        .admin_mint(AdminMintCmd::new(
            AdminOperation::Create,
            Money::new(50_000),
            "treasury",
        ))
        .await
        .unwrap();
    assert_eq!(wallet.becoin, Money::new(50_000));
    assert_eq!(record.operation, AdminOperation::Create);

    let (wallet, record) = engine
        .admin_mint(AdminMintCmd::new(
            AdminOperation::Destroy,
            Money::new(20_000),
            "treasury",
        ))
        .await
        .unwrap();
    assert_eq!(wallet.becoin, Money::new(30_000));
    assert_eq!(record.operation, AdminOperation::Destroy);

    // Destroying more than the outstanding supply on the system wallet
    // is an overdraft like any other.
    let err = engine
        .admin_mint(AdminMintCmd::new(
            AdminOperation::Destroy,
            Money::new(40_000),
            "treasury",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
}

#[tokio::test]
async fn admin_mint_requires_configured_system_wallet() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .admin_mint(AdminMintCmd::new(
            AdminOperation::Create,
            Money::new(100),
            "alice",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveValue, EntityTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "beco={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    if let Some(server) = settings.server {
        let system_user = settings.app.system_user.clone();
        tasks.spawn(async move {
            tracing::info!("Found server settings...");
            let db = match parse_database(&server.database).await {
                Ok(db) => db,
                Err(err) => {
                    tracing::error!("failed to initialize database: {err}");
                    return;
                }
            };

            let system_wallet_id = match bootstrap_system_wallet(&db, &system_user).await {
                Ok(id) => id,
                Err(err) => {
                    tracing::error!("failed to bootstrap system wallet: {err}");
                    return;
                }
            };

            let notifier = Arc::new(engine::BroadcastNotifier::new(256));
            let engine = match engine::Engine::builder()
                .database(db.clone())
                .system_wallet(system_wallet_id)
                .notifier(notifier)
                .build()
                .await
            {
                Ok(engine) => engine,
                Err(err) => {
                    tracing::error!("failed to build engine from database: {err}");
                    return;
                }
            };

            let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
            let addr = format!("{}:{}", bind, server.port);
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind server listener: {err}");
                    return;
                }
            };
            if let Err(err) = server::run_with_listener(engine, db, listener).await {
                tracing::error!("server failed: {err}");
            }
        });
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

/// Resolves the system wallet once at startup, creating the owning
/// account and wallet when missing. The id is then passed explicitly
/// into the engine builder.
async fn bootstrap_system_wallet(
    db: &sea_orm::DatabaseConnection,
    system_user: &str,
) -> Result<uuid::Uuid, Box<dyn std::error::Error + Send + Sync>> {
    use engine::users;

    if users::Entity::find_by_id(system_user.to_string())
        .one(db)
        .await?
        .is_none()
    {
        let user = users::ActiveModel {
            username: ActiveValue::Set(system_user.to_string()),
            // The system account never logs in; no usable password.
            password: ActiveValue::Set(String::new()),
            role_name: ActiveValue::Set(users::ROLE_ADMIN.to_string()),
        };
        users::Entity::insert(user).exec(db).await?;
    }

    let bootstrap = engine::Engine::builder().database(db.clone()).build().await?;
    let wallet = bootstrap.ensure_wallet(system_user).await?;
    Ok(wallet.id)
}

pub use sea_orm_migration::prelude::*;

mod m20250110_000001_users;
mod m20250110_000002_wallets;
mod m20250110_000003_transaction_registry;
mod m20250110_000004_transactions;
mod m20250112_000001_commerce;
mod m20250115_000001_coupons;
mod m20250115_000002_admin_becoins;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250110_000001_users::Migration),
            Box::new(m20250110_000002_wallets::Migration),
            Box::new(m20250110_000003_transaction_registry::Migration),
            Box::new(m20250110_000004_transactions::Migration),
            Box::new(m20250112_000001_commerce::Migration),
            Box::new(m20250115_000001_coupons::Migration),
            Box::new(m20250115_000002_admin_becoins::Migration),
        ]
    }
}

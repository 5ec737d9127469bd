use sea_orm_migration::prelude::*;

use crate::m20250110_000002_wallets::Wallets;
use crate::m20250110_000003_transaction_registry::{TransactionStates, TransactionTypes};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Transactions {
    Table,
    Id,
    WalletId,
    TypeCode,
    StateCode,
    Balance,
    Direction,
    AmountMinor,
    RelatedWalletId,
    OrderId,
    Note,
    CreatedBy,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::WalletId).string().not_null())
                    .col(ColumnDef::new(Transactions::TypeCode).string().not_null())
                    .col(ColumnDef::new(Transactions::StateCode).string().not_null())
                    .col(ColumnDef::new(Transactions::Balance).string().not_null())
                    .col(ColumnDef::new(Transactions::Direction).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::RelatedWalletId).string())
                    .col(ColumnDef::new(Transactions::OrderId).string())
                    .col(ColumnDef::new(Transactions::Note).string())
                    .col(ColumnDef::new(Transactions::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-wallet_id")
                            .from(Transactions::Table, Transactions::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-type_code")
                            .from(Transactions::Table, Transactions::TypeCode)
                            .to(TransactionTypes::Table, TransactionTypes::Code),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-state_code")
                            .from(Transactions::Table, Transactions::StateCode)
                            .to(TransactionStates::Table, TransactionStates::Code),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-wallet_id-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::WalletId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-order_id")
                    .table(Transactions::Table)
                    .col(Transactions::OrderId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await
    }
}

use sea_orm_migration::prelude::*;

use crate::m20250110_000004_transactions::Transactions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum AdminBecoins {
    Table,
    Id,
    TransactionId,
    OperationType,
    AmountMinor,
    CreatedBy,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdminBecoins::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdminBecoins::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AdminBecoins::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdminBecoins::OperationType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdminBecoins::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AdminBecoins::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(AdminBecoins::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-admin_becoins-transaction_id")
                            .from(AdminBecoins::Table, AdminBecoins::TransactionId)
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-admin_becoins-transaction_id")
                    .table(AdminBecoins::Table)
                    .col(AdminBecoins::TransactionId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdminBecoins::Table).to_owned())
            .await
    }
}

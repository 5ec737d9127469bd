use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum TransactionTypes {
    Table,
    Code,
    Description,
}

#[derive(Iden)]
pub enum TransactionStates {
    Table,
    Code,
    Description,
}

const TYPES: &[(&str, &str)] = &[
    ("RECHARGE", "Top up a wallet"),
    ("WITHDRAW", "Withdraw from a wallet"),
    ("TRANSFER", "Move becoin between wallets"),
    ("PURCHASE", "Pay for an order"),
    ("RECYCLE", "Reward for recycled material"),
    ("DONATION", "Donate becoin"),
    ("BONUS", "Coupon bonus coins"),
    ("MINT", "Administrative supply creation"),
    ("DESTROY", "Administrative supply destruction"),
];

const STATES: &[(&str, &str)] = &[
    ("PENDING", "Awaiting confirmation"),
    ("COMPLETED", "Settled"),
    ("FAILED", "Rejected or errored"),
    ("CANCELLED", "Cancelled before settlement"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TransactionTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionTypes::Code)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransactionTypes::Description)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TransactionStates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionStates::Code)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransactionStates::Description)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Preload: the registry is data, not code. New transaction kinds
        // are added by inserting here, without touching the mutation
        // paths.
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        for (code, description) in TYPES {
            let stmt = Query::insert()
                .into_table(TransactionTypes::Table)
                .columns([TransactionTypes::Code, TransactionTypes::Description])
                .values_panic([(*code).into(), (*description).into()])
                .to_owned();
            db.execute(backend.build(&stmt)).await?;
        }

        for (code, description) in STATES {
            let stmt = Query::insert()
                .into_table(TransactionStates::Table)
                .columns([TransactionStates::Code, TransactionStates::Description])
                .values_panic([(*code).into(), (*description).into()])
                .to_owned();
            db.execute(backend.build(&stmt)).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TransactionStates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionTypes::Table).to_owned())
            .await
    }
}

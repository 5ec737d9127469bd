use sea_orm_migration::prelude::*;

use crate::m20250110_000002_wallets::Wallets;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum PaymentTypes {
    Table,
    Code,
    Description,
    IsBecoin,
}

#[derive(Iden)]
pub enum DeliveryStatuses {
    Table,
    Code,
    Description,
}

#[derive(Iden)]
pub enum Carts {
    Table,
    Id,
    UserId,
    TotalAmount,
    TotalItems,
    TotalBecoin,
    TotalWeight,
    TotalWeightRecycled,
    UpdatedAt,
}

#[derive(Iden)]
pub enum CartItems {
    Table,
    Id,
    CartId,
    Name,
    Quantity,
    UnitPriceMinor,
    UnitBecoinMinor,
    UnitWeightGrams,
    Recycled,
}

#[derive(Iden)]
pub enum Orders {
    Table,
    Id,
    Code,
    UserId,
    WalletId,
    PaymentTypeCode,
    StatusCode,
    CouponId,
    TotalAmount,
    TotalItems,
    TotalBecoin,
    TotalWeight,
    TotalWeightRecycled,
    DiscountMinor,
    Observation,
    CreatedAt,
}

#[derive(Iden)]
pub enum OrderItems {
    Table,
    Id,
    OrderId,
    Name,
    Quantity,
    UnitPriceMinor,
    UnitBecoinMinor,
    UnitWeightGrams,
    Recycled,
}

const PAYMENT_TYPES: &[(&str, &str, bool)] = &[
    ("BECOIN", "Pay with wallet becoin", true),
    ("CASH", "Pay cash on delivery", false),
    ("CARD", "Pay by card through the gateway", false),
];

const DELIVERY_STATUSES: &[(&str, &str)] = &[
    ("CREATED", "Order created"),
    ("AWAITING_PAYMENT", "Waiting for external payment"),
    ("PREPARING", "Payment settled, preparing"),
    ("SHIPPED", "Handed to the courier"),
    ("DELIVERED", "Delivered"),
    ("CANCELLED", "Cancelled"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaymentTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentTypes::Code)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentTypes::Description).string().not_null())
                    .col(ColumnDef::new(PaymentTypes::IsBecoin).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DeliveryStatuses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DeliveryStatuses::Code)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DeliveryStatuses::Description)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Carts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Carts::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Carts::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Carts::TotalAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Carts::TotalItems)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Carts::TotalBecoin)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Carts::TotalWeight)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Carts::TotalWeightRecycled)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Carts::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-carts-user_id")
                    .table(Carts::Table)
                    .col(Carts::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CartItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CartItems::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CartItems::CartId).string().not_null())
                    .col(ColumnDef::new(CartItems::Name).string().not_null())
                    .col(ColumnDef::new(CartItems::Quantity).big_integer().not_null())
                    .col(
                        ColumnDef::new(CartItems::UnitPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CartItems::UnitBecoinMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CartItems::UnitWeightGrams)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CartItems::Recycled).boolean().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cart_items-cart_id")
                            .from(CartItems::Table, CartItems::CartId)
                            .to(Carts::Table, Carts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cart_items-cart_id")
                    .table(CartItems::Table)
                    .col(CartItems::CartId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Orders::Code).string().not_null())
                    .col(ColumnDef::new(Orders::UserId).string().not_null())
                    .col(ColumnDef::new(Orders::WalletId).string().not_null())
                    .col(
                        ColumnDef::new(Orders::PaymentTypeCode)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Orders::StatusCode).string().not_null())
                    .col(ColumnDef::new(Orders::CouponId).string())
                    .col(ColumnDef::new(Orders::TotalAmount).big_integer().not_null())
                    .col(ColumnDef::new(Orders::TotalItems).big_integer().not_null())
                    .col(ColumnDef::new(Orders::TotalBecoin).big_integer().not_null())
                    .col(ColumnDef::new(Orders::TotalWeight).big_integer().not_null())
                    .col(
                        ColumnDef::new(Orders::TotalWeightRecycled)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::DiscountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Orders::Observation).string())
                    .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-orders-wallet_id")
                            .from(Orders::Table, Orders::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-orders-payment_type_code")
                            .from(Orders::Table, Orders::PaymentTypeCode)
                            .to(PaymentTypes::Table, PaymentTypes::Code),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-orders-status_code")
                            .from(Orders::Table, Orders::StatusCode)
                            .to(DeliveryStatuses::Table, DeliveryStatuses::Code),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-orders-code")
                    .table(Orders::Table)
                    .col(Orders::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-orders-user_id-created_at")
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .col(Orders::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderItems::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderItems::OrderId).string().not_null())
                    .col(ColumnDef::new(OrderItems::Name).string().not_null())
                    .col(
                        ColumnDef::new(OrderItems::Quantity)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::UnitPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::UnitBecoinMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::UnitWeightGrams)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderItems::Recycled).boolean().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-order_items-order_id")
                            .from(OrderItems::Table, OrderItems::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-order_items-order_id")
                    .table(OrderItems::Table)
                    .col(OrderItems::OrderId)
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();
        let backend = db.get_database_backend();

        for (code, description, is_becoin) in PAYMENT_TYPES {
            let stmt = Query::insert()
                .into_table(PaymentTypes::Table)
                .columns([
                    PaymentTypes::Code,
                    PaymentTypes::Description,
                    PaymentTypes::IsBecoin,
                ])
                .values_panic([(*code).into(), (*description).into(), (*is_becoin).into()])
                .to_owned();
            db.execute(backend.build(&stmt)).await?;
        }

        for (code, description) in DELIVERY_STATUSES {
            let stmt = Query::insert()
                .into_table(DeliveryStatuses::Table)
                .columns([DeliveryStatuses::Code, DeliveryStatuses::Description])
                .values_panic([(*code).into(), (*description).into()])
                .to_owned();
            db.execute(backend.build(&stmt)).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CartItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Carts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DeliveryStatuses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentTypes::Table).to_owned())
            .await
    }
}

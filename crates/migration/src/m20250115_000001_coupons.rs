use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Coupons {
    Table,
    Id,
    Code,
    Kind,
    ValueKind,
    Value,
    MaxDiscountMinor,
    MinSpendMinor,
    ExpiresAt,
    MaxUsageCount,
    UsageLimitPerUser,
    IsActive,
}

#[derive(Iden)]
pub enum CouponUsages {
    Table,
    Id,
    CouponId,
    UserId,
    OrderId,
    OriginalAmountMinor,
    DiscountAmountMinor,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Coupons::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Coupons::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Coupons::Code).string().not_null())
                    .col(ColumnDef::new(Coupons::Kind).string().not_null())
                    .col(ColumnDef::new(Coupons::ValueKind).string().not_null())
                    .col(ColumnDef::new(Coupons::Value).big_integer().not_null())
                    .col(ColumnDef::new(Coupons::MaxDiscountMinor).big_integer())
                    .col(
                        ColumnDef::new(Coupons::MinSpendMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Coupons::ExpiresAt).timestamp())
                    .col(ColumnDef::new(Coupons::MaxUsageCount).big_integer())
                    .col(ColumnDef::new(Coupons::UsageLimitPerUser).big_integer())
                    .col(
                        ColumnDef::new(Coupons::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-coupons-code")
                    .table(Coupons::Table)
                    .col(Coupons::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CouponUsages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CouponUsages::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CouponUsages::CouponId).string().not_null())
                    .col(ColumnDef::new(CouponUsages::UserId).string().not_null())
                    .col(ColumnDef::new(CouponUsages::OrderId).string())
                    .col(
                        ColumnDef::new(CouponUsages::OriginalAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CouponUsages::DiscountAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CouponUsages::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-coupon_usages-coupon_id")
                            .from(CouponUsages::Table, CouponUsages::CouponId)
                            .to(Coupons::Table, Coupons::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-coupon_usages-coupon_id-user_id")
                    .table(CouponUsages::Table)
                    .col(CouponUsages::CouponId)
                    .col(CouponUsages::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CouponUsages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Coupons::Table).to_owned())
            .await
    }
}

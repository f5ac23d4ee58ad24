//! Create bills table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bills::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bills::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bills::MeterId).string().not_null())
                    .col(ColumnDef::new(Bills::BillingMonth).string().not_null())
                    .col(ColumnDef::new(Bills::PeriodStart).date().not_null())
                    .col(ColumnDef::new(Bills::PeriodEnd).date().not_null())
                    .col(
                        ColumnDef::new(Bills::PreviousReading)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bills::CurrentReading)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bills::UsageM3)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bills::DifferenceUsageM3)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bills::BaseWaterCharge)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bills::MaintenanceFee)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bills::SanitationFee)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bills::SewerageCharge)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bills::MeterRent)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bills::VatAmount)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bills::BalanceCarriedForward)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bills::TotalAmountDue)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Bills::DueDate).date().not_null())
                    .col(
                        ColumnDef::new(Bills::PaymentStatus)
                            .string()
                            .not_null()
                            .default("Unpaid"),
                    )
                    .col(ColumnDef::new(Bills::Notes).string())
                    .col(
                        ColumnDef::new(Bills::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One bill per meter and billing month
        manager
            .create_index(
                Index::create()
                    .name("idx_bills_meter_month")
                    .table(Bills::Table)
                    .col(Bills::MeterId)
                    .col(Bills::BillingMonth)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bills::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Bills {
    Table,
    Id,
    MeterId,
    BillingMonth,
    PeriodStart,
    PeriodEnd,
    PreviousReading,
    CurrentReading,
    UsageM3,
    DifferenceUsageM3,
    BaseWaterCharge,
    MaintenanceFee,
    SanitationFee,
    SewerageCharge,
    MeterRent,
    VatAmount,
    BalanceCarriedForward,
    TotalAmountDue,
    DueDate,
    PaymentStatus,
    Notes,
    CreatedAt,
}

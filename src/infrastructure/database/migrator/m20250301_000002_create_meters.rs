//! Create meters table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Meters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Meters::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Meters::CustomerType)
                            .string()
                            .not_null()
                            .default("Domestic"),
                    )
                    .col(
                        ColumnDef::new(Meters::MeterSizeInches)
                            .decimal_len(8, 4)
                            .not_null()
                            .default(0.5),
                    )
                    .col(
                        ColumnDef::new(Meters::SewerageConnection)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Meters::IsBulk)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Meters::BulkMeterId).string())
                    .col(
                        ColumnDef::new(Meters::PreviousReading)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Meters::CurrentReading)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Meters::OutstandingBalance)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Meters::PaymentStatus)
                            .string()
                            .not_null()
                            .default("Unpaid"),
                    )
                    .col(ColumnDef::new(Meters::BillingMonth).string())
                    .col(
                        ColumnDef::new(Meters::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Meters::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookup of individual meters under a bulk meter
        manager
            .create_index(
                Index::create()
                    .name("idx_meters_bulk_meter_id")
                    .table(Meters::Table)
                    .col(Meters::BulkMeterId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Meters::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Meters {
    Table,
    Id,
    CustomerType,
    MeterSizeInches,
    SewerageConnection,
    IsBulk,
    BulkMeterId,
    PreviousReading,
    CurrentReading,
    OutstandingBalance,
    PaymentStatus,
    BillingMonth,
    CreatedAt,
    UpdatedAt,
}

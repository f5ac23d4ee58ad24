//! Create tariff_schedules table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TariffSchedules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TariffSchedules::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TariffSchedules::CustomerType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TariffSchedules::Year).integer().not_null())
                    .col(
                        ColumnDef::new(TariffSchedules::Tiers)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(TariffSchedules::SewerageTiers)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(TariffSchedules::MaintenancePercentage)
                            .decimal_len(8, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TariffSchedules::SanitationPercentage)
                            .decimal_len(8, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TariffSchedules::MeterRentBrackets)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(TariffSchedules::VatRate)
                            .decimal_len(8, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TariffSchedules::DomesticVatThresholdM3)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TariffSchedules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TariffSchedules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One schedule per customer type and year
        manager
            .create_index(
                Index::create()
                    .name("idx_tariff_schedules_type_year")
                    .table(TariffSchedules::Table)
                    .col(TariffSchedules::CustomerType)
                    .col(TariffSchedules::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Insert default domestic schedule
        let insert = Query::insert()
            .into_table(TariffSchedules::Table)
            .columns([
                TariffSchedules::CustomerType,
                TariffSchedules::Year,
                TariffSchedules::Tiers,
                TariffSchedules::SewerageTiers,
                TariffSchedules::MaintenancePercentage,
                TariffSchedules::SanitationPercentage,
                TariffSchedules::MeterRentBrackets,
                TariffSchedules::VatRate,
                TariffSchedules::DomesticVatThresholdM3,
                TariffSchedules::CreatedAt,
                TariffSchedules::UpdatedAt,
            ])
            .values_panic([
                "Domestic".into(),
                2025.into(),
                r#"[{"upper_bound_m3":"10","rate_per_m3":"5.00"},{"upper_bound_m3":"20","rate_per_m3":"8.50"},{"upper_bound_m3":"30","rate_per_m3":"12.00"},{"upper_bound_m3":null,"rate_per_m3":"20.00"}]"#.into(),
                r#"[{"upper_bound_m3":"10","rate_per_m3":"2.00"},{"upper_bound_m3":null,"rate_per_m3":"4.00"}]"#.into(),
                0.05f64.into(),
                0.03f64.into(),
                r#"[{"max_size_inches":"0.5","monthly_rent":"50"},{"max_size_inches":"0.75","monthly_rent":"75"},{"max_size_inches":"1","monthly_rent":"100"},{"max_size_inches":"2","monthly_rent":"250"},{"max_size_inches":"4","monthly_rent":"1000"}]"#.into(),
                0.13f64.into(),
                10.into(),
                chrono::Utc::now().to_rfc3339().into(),
                chrono::Utc::now().to_rfc3339().into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TariffSchedules::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum TariffSchedules {
    Table,
    Id,
    CustomerType,
    Year,
    Tiers,
    SewerageTiers,
    MaintenancePercentage,
    SanitationPercentage,
    MeterRentBrackets,
    VatRate,
    DomesticVatThresholdM3,
    CreatedAt,
    UpdatedAt,
}

//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_tariff_schedules;
mod m20250301_000002_create_meters;
mod m20250301_000003_create_bills;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_tariff_schedules::Migration),
            Box::new(m20250301_000002_create_meters::Migration),
            Box::new(m20250301_000003_create_bills::Migration),
        ]
    }
}

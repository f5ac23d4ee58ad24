//! SeaORM implementation of RepositoryProvider

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::domain::bill::BillRepository;
use crate::domain::meter::MeterRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::tariff::TariffScheduleRepository;

use super::bill_repository::SeaOrmBillRepository;
use super::meter_repository::SeaOrmMeterRepository;
use super::tariff_repository::{CachingTariffScheduleRepository, SeaOrmTariffScheduleRepository};

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
/// Tariff schedule lookups go through a read-through cache.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let meter = repos.meters().find_by_id("BM-001").await?;
/// let exists = repos.bills().exists_for("BM-001", "2025-07").await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    tariff_schedules: CachingTariffScheduleRepository,
    meters: SeaOrmMeterRepository,
    bills: SeaOrmBillRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            tariff_schedules: CachingTariffScheduleRepository::new(Arc::new(
                SeaOrmTariffScheduleRepository::new(db.clone()),
            )),
            meters: SeaOrmMeterRepository::new(db.clone()),
            bills: SeaOrmBillRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn tariff_schedules(&self) -> &dyn TariffScheduleRepository {
        &self.tariff_schedules
    }

    fn meters(&self) -> &dyn MeterRepository {
        &self.meters
    }

    fn bills(&self) -> &dyn BillRepository {
        &self.bills
    }
}

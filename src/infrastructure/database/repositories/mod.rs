//! SeaORM repository implementations

pub mod bill_repository;
pub mod meter_repository;
pub mod repository_provider;
pub mod tariff_repository;

pub use bill_repository::SeaOrmBillRepository;
pub use meter_repository::SeaOrmMeterRepository;
pub use repository_provider::SeaOrmRepositoryProvider;
pub use tariff_repository::{CachingTariffScheduleRepository, SeaOrmTariffScheduleRepository};

pub mod bill;
pub mod meter;
pub mod repositories;
pub mod tariff;

// Re-export commonly used types
pub use bill::{Bill, BillRepository};
pub use meter::{BillingMonth, CycleClose, MeterAccount, MeterRepository, PaymentStatus};
pub use repositories::{DomainResult, RepositoryProvider};
pub use tariff::{
    ChargeBreakdown, CustomerType, RentBracket, TariffSchedule, TariffScheduleRepository, Tier,
};

// Re-export DomainError from shared for convenience
pub use crate::shared::errors::DomainError;

pub mod model;
pub mod repository;

pub use model::{banded_charge, ChargeBreakdown, CustomerType, RentBracket, TariffSchedule, Tier};
pub use repository::TariffScheduleRepository;

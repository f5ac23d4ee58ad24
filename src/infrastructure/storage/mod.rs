pub mod memory;

pub use memory::{
    InMemoryBillRepository, InMemoryMeterRepository, InMemoryRepositoryProvider,
    InMemoryTariffScheduleRepository,
};

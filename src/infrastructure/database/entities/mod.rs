pub mod bill;
pub mod meter;
pub mod tariff_schedule;

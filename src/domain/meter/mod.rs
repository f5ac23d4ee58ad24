pub mod model;
pub mod repository;

pub use model::{BillingMonth, MeterAccount, PaymentStatus};
pub use repository::{CycleClose, MeterRepository};

pub mod batch;
pub mod cycle;
pub mod pricing;
pub mod reconciliation;

pub use batch::{BatchReport, BatchRunner};
pub use cycle::{ClosureOutcome, CycleClosureService, CycleError, CycleState};
pub use pricing::PricingService;
pub use reconciliation::{reconcile_difference, MIN_DIFFERENCE_USAGE_M3};

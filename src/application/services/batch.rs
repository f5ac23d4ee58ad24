//! Bulk-cycle batch runner
//!
//! Drives cycle closure across every bulk meter, one meter at a time so the
//! shared store is never hammered and per-meter serialization holds by
//! construction. Cancellation is cooperative: a triggered shutdown stops
//! launching new closures but the in-flight one finishes or compensates.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::services::cycle::{ClosureOutcome, CycleClosureService, CycleError};
use crate::domain::{DomainResult, RepositoryProvider};
use crate::shared::shutdown::ShutdownSignal;

/// Per-meter detail for one batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub closed: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, CycleError)>,
    /// True when a shutdown stopped the run before every meter was visited
    pub cancelled: bool,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }

    fn processed(&self) -> usize {
        self.closed.len() + self.skipped.len() + self.failed.len()
    }
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "closed={} skipped={} failed={}{}",
            self.closed.len(),
            self.skipped.len(),
            self.failed.len(),
            if self.cancelled { " (cancelled)" } else { "" }
        )
    }
}

pub struct BatchRunner {
    repos: Arc<dyn RepositoryProvider>,
    cycles: Arc<CycleClosureService>,
    carry_balance: bool,
}

impl BatchRunner {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        cycles: Arc<CycleClosureService>,
        carry_balance: bool,
    ) -> Self {
        Self {
            repos,
            cycles,
            carry_balance,
        }
    }

    /// Close the current cycle for every bulk meter that does not yet have a
    /// bill for its billing month. Re-running in the same month is a no-op
    /// for already-billed meters.
    pub async fn run(&self, shutdown: &ShutdownSignal) -> DomainResult<BatchReport> {
        let meters = self.repos.meters().find_bulk_meters().await?;
        info!(meter_count = meters.len(), "Starting bulk billing-cycle batch");

        let mut report = BatchReport::default();
        for meter in meters {
            if shutdown.is_triggered() {
                warn!(
                    processed = report.processed(),
                    "Shutdown triggered, stopping batch before next meter"
                );
                report.cancelled = true;
                break;
            }

            match self.cycles.close_cycle(&meter.id, self.carry_balance).await {
                Ok(ClosureOutcome::Closed { meter_id, .. }) => report.closed.push(meter_id),
                Ok(ClosureOutcome::Skipped { meter_id, .. }) => report.skipped.push(meter_id),
                Err(err) => {
                    warn!(meter_id = %meter.id, error = %err, "Cycle closure failed");
                    report.failed.push((meter.id.clone(), err));
                }
            }
        }

        info!(summary = %report, "Bulk billing-cycle batch finished");
        Ok(report)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::pricing::PricingService;
    use crate::domain::{
        CustomerType, MeterAccount, PaymentStatus, RentBracket, TariffSchedule, Tier,
    };
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use crate::notifications::create_event_bus;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn schedule() -> TariffSchedule {
        TariffSchedule {
            customer_type: CustomerType::Domestic,
            year: 2025,
            tiers: vec![Tier { upper_bound_m3: None, rate_per_m3: dec!(5.00) }],
            sewerage_tiers: vec![],
            maintenance_percentage: dec!(0.05),
            sanitation_percentage: dec!(0.03),
            meter_rent_brackets: vec![RentBracket {
                max_size_inches: dec!(4),
                monthly_rent: dec!(100),
            }],
            vat_rate: dec!(0.13),
            domestic_vat_threshold_m3: dec!(10),
        }
    }

    fn bulk_meter(id: &str, prev: Decimal, current: Decimal) -> MeterAccount {
        MeterAccount {
            id: id.to_string(),
            customer_type: CustomerType::Domestic,
            meter_size_inches: dec!(2),
            sewerage_connection: false,
            is_bulk: true,
            bulk_meter_id: None,
            previous_reading: prev,
            current_reading: current,
            outstanding_balance: dec!(0),
            payment_status: PaymentStatus::Paid,
            billing_month: Some("2025-07".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn runner(provider: Arc<InMemoryRepositoryProvider>) -> BatchRunner {
        let bus = create_event_bus();
        let pricing = Arc::new(PricingService::new(provider.clone(), bus.clone()));
        let cycles = Arc::new(CycleClosureService::new(provider.clone(), pricing, bus));
        BatchRunner::new(provider, cycles, true)
    }

    #[tokio::test]
    async fn batch_closes_all_eligible_meters() {
        let provider = Arc::new(InMemoryRepositoryProvider::new());
        provider.tariff_schedules().save(schedule()).await.unwrap();
        provider.meters().save(bulk_meter("BM-001", dec!(0), dec!(20))).await.unwrap();
        provider.meters().save(bulk_meter("BM-002", dec!(0), dec!(50))).await.unwrap();

        let runner = runner(provider.clone()).await;
        let report = runner.run(&ShutdownSignal::new()).await.unwrap();
        assert_eq!(report.closed.len(), 2);
        assert!(report.skipped.is_empty());
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn second_run_in_same_month_is_idempotent() {
        let provider = Arc::new(InMemoryRepositoryProvider::new());
        provider.tariff_schedules().save(schedule()).await.unwrap();
        provider.meters().save(bulk_meter("BM-001", dec!(0), dec!(20))).await.unwrap();

        let runner = runner(provider.clone()).await;
        let first = runner.run(&ShutdownSignal::new()).await.unwrap();
        assert_eq!(first.closed.len(), 1);

        let second = runner.run(&ShutdownSignal::new()).await.unwrap();
        assert!(second.closed.is_empty());
        assert_eq!(second.skipped.len(), 1);

        // final state identical to a single run: one bill in the ledger
        let bills = provider.bills().find_for_meter("BM-001").await.unwrap();
        assert_eq!(bills.len(), 1);
    }

    #[tokio::test]
    async fn failures_are_reported_per_meter_and_do_not_stop_the_batch() {
        let provider = Arc::new(InMemoryRepositoryProvider::new());
        provider.tariff_schedules().save(schedule()).await.unwrap();
        let mut broken = bulk_meter("BM-000", dec!(0), dec!(20));
        broken.billing_month = None;
        provider.meters().save(broken).await.unwrap();
        provider.meters().save(bulk_meter("BM-001", dec!(0), dec!(20))).await.unwrap();

        let runner = runner(provider.clone()).await;
        let report = runner.run(&ShutdownSignal::new()).await.unwrap();
        assert_eq!(report.closed.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "BM-000");
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn triggered_shutdown_stops_launching_closures() {
        let provider = Arc::new(InMemoryRepositoryProvider::new());
        provider.tariff_schedules().save(schedule()).await.unwrap();
        provider.meters().save(bulk_meter("BM-001", dec!(0), dec!(20))).await.unwrap();

        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let runner = runner(provider.clone()).await;
        let report = runner.run(&shutdown).await.unwrap();
        assert!(report.cancelled);
        assert!(report.closed.is_empty());
        assert!(provider.bills().find_for_meter("BM-001").await.unwrap().is_empty());
    }
}

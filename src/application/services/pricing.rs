//! Pricing service: resolves the tariff schedule for a billing month and
//! prices a usage figure into a full charge breakdown.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::{
    BillingMonth, ChargeBreakdown, CustomerType, DomainResult, RepositoryProvider,
};
use crate::notifications::{Event, SharedEventBus, TariffMissingEvent};

pub struct PricingService {
    repos: Arc<dyn RepositoryProvider>,
    event_bus: SharedEventBus,
}

impl PricingService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, event_bus: SharedEventBus) -> Self {
        Self { repos, event_bus }
    }

    /// Price a usage figure for `(customer_type, year of billing month)`.
    ///
    /// When no schedule exists the result degrades to an all-zero breakdown
    /// instead of failing, so billing screens stay usable while tariff data
    /// is missing. The degradation is logged and published, never silent.
    /// Repository read failures still propagate.
    pub async fn calculate(
        &self,
        usage_m3: Decimal,
        customer_type: CustomerType,
        sewerage_connection: bool,
        meter_size_inches: Decimal,
        billing_month: BillingMonth,
    ) -> DomainResult<ChargeBreakdown> {
        let schedule = self
            .repos
            .tariff_schedules()
            .find(customer_type, billing_month.year)
            .await?;

        match schedule {
            Some(schedule) => {
                Ok(schedule.calculate(usage_m3, sewerage_connection, meter_size_inches))
            }
            None => {
                warn!(
                    customer_type = %customer_type,
                    year = billing_month.year,
                    "No tariff schedule found, degrading to zero-valued bill"
                );
                self.event_bus.publish(Event::TariffMissing(TariffMissingEvent {
                    customer_type: customer_type.to_string(),
                    year: billing_month.year,
                    timestamp: Utc::now(),
                }));
                Ok(ChargeBreakdown::zero())
            }
        }
    }
}

//! Tariff schedule repository interface

use async_trait::async_trait;

use super::model::{CustomerType, TariffSchedule};
use crate::domain::DomainResult;

#[async_trait]
pub trait TariffScheduleRepository: Send + Sync {
    /// Latest schedule for a (customer type, year) pair
    async fn find(
        &self,
        customer_type: CustomerType,
        year: i32,
    ) -> DomainResult<Option<TariffSchedule>>;

    async fn find_all(&self) -> DomainResult<Vec<TariffSchedule>>;

    async fn save(&self, schedule: TariffSchedule) -> DomainResult<TariffSchedule>;

    /// Drop any cached schedules so the next lookup reloads from the store.
    /// Callers are responsible for triggering this after rate changes.
    async fn refresh(&self) -> DomainResult<()>;
}

//! Meter account repository interface

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::model::{MeterAccount, PaymentStatus};
use crate::domain::DomainResult;

/// Cycle-closure update for one meter.
///
/// `expected_current_reading` is the reading snapshot the closure computed
/// from; the update must fail with `DomainError::StaleState` when the stored
/// reading has moved since, so a closure never commits against stale data.
#[derive(Debug, Clone)]
pub struct CycleClose {
    pub meter_id: String,
    pub expected_current_reading: Decimal,
    pub new_outstanding_balance: Decimal,
    pub payment_status: PaymentStatus,
}

#[async_trait]
pub trait MeterRepository: Send + Sync {
    /// Latest persisted state by id
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<MeterAccount>>;

    /// Individual meters fed from the given bulk meter
    async fn find_assigned_to(&self, bulk_meter_id: &str) -> DomainResult<Vec<MeterAccount>>;

    async fn find_bulk_meters(&self) -> DomainResult<Vec<MeterAccount>>;

    async fn save(&self, meter: MeterAccount) -> DomainResult<MeterAccount>;

    /// Roll the meter forward: `previous_reading <- expected_current_reading`,
    /// balance and payment status as given.
    async fn close_cycle(&self, close: CycleClose) -> DomainResult<()>;
}

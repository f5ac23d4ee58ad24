//! In-memory repository implementations for development and testing

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::domain::{
    Bill, BillRepository, CustomerType, CycleClose, DomainError, DomainResult, MeterAccount,
    MeterRepository, RepositoryProvider, TariffSchedule, TariffScheduleRepository,
};

#[derive(Clone, Default)]
pub struct InMemoryTariffScheduleRepository {
    schedules: Arc<DashMap<(CustomerType, i32), TariffSchedule>>,
}

#[async_trait]
impl TariffScheduleRepository for InMemoryTariffScheduleRepository {
    async fn find(
        &self,
        customer_type: CustomerType,
        year: i32,
    ) -> DomainResult<Option<TariffSchedule>> {
        Ok(self
            .schedules
            .get(&(customer_type, year))
            .map(|s| s.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<TariffSchedule>> {
        Ok(self.schedules.iter().map(|s| s.clone()).collect())
    }

    async fn save(&self, schedule: TariffSchedule) -> DomainResult<TariffSchedule> {
        self.schedules
            .insert((schedule.customer_type, schedule.year), schedule.clone());
        Ok(schedule)
    }

    async fn refresh(&self) -> DomainResult<()> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryMeterRepository {
    meters: Arc<DashMap<String, MeterAccount>>,
}

#[async_trait]
impl MeterRepository for InMemoryMeterRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<MeterAccount>> {
        Ok(self.meters.get(id).map(|m| m.clone()))
    }

    async fn find_assigned_to(&self, bulk_meter_id: &str) -> DomainResult<Vec<MeterAccount>> {
        Ok(self
            .meters
            .iter()
            .filter(|m| m.bulk_meter_id.as_deref() == Some(bulk_meter_id))
            .map(|m| m.clone())
            .collect())
    }

    async fn find_bulk_meters(&self) -> DomainResult<Vec<MeterAccount>> {
        Ok(self
            .meters
            .iter()
            .filter(|m| m.is_bulk)
            .map(|m| m.clone())
            .collect())
    }

    async fn save(&self, meter: MeterAccount) -> DomainResult<MeterAccount> {
        self.meters.insert(meter.id.clone(), meter.clone());
        Ok(meter)
    }

    async fn close_cycle(&self, close: CycleClose) -> DomainResult<()> {
        let Some(mut meter) = self.meters.get_mut(&close.meter_id) else {
            return Err(DomainError::NotFound {
                entity: "Meter",
                field: "id",
                value: close.meter_id.clone(),
            });
        };
        if meter.current_reading != close.expected_current_reading {
            return Err(DomainError::StaleState(format!(
                "Meter {} reading moved to {} (closure computed from {})",
                close.meter_id, meter.current_reading, close.expected_current_reading
            )));
        }
        meter.previous_reading = close.expected_current_reading;
        meter.outstanding_balance = close.new_outstanding_balance;
        meter.payment_status = close.payment_status;
        meter.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryBillRepository {
    bills: Arc<DashMap<i64, Bill>>,
    counter: Arc<AtomicI64>,
}

#[async_trait]
impl BillRepository for InMemoryBillRepository {
    async fn insert(&self, mut bill: Bill) -> DomainResult<Bill> {
        if self.exists_for(&bill.meter_id, &bill.billing_month).await? {
            return Err(DomainError::Conflict(format!(
                "Bill for meter {} in {}",
                bill.meter_id, bill.billing_month
            )));
        }
        bill.id = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.bills.insert(bill.id, bill.clone());
        Ok(bill)
    }

    async fn delete(&self, id: i64) -> DomainResult<()> {
        // Idempotent: deleting an already-deleted bill succeeds
        self.bills.remove(&id);
        Ok(())
    }

    async fn exists_for(&self, meter_id: &str, billing_month: &str) -> DomainResult<bool> {
        Ok(self
            .bills
            .iter()
            .any(|b| b.meter_id == meter_id && b.billing_month == billing_month))
    }

    async fn find_for_meter(&self, meter_id: &str) -> DomainResult<Vec<Bill>> {
        Ok(self
            .bills
            .iter()
            .filter(|b| b.meter_id == meter_id)
            .map(|b| b.clone())
            .collect())
    }
}

/// In-memory provider wiring the three repositories together
#[derive(Clone, Default)]
pub struct InMemoryRepositoryProvider {
    tariff_schedules: InMemoryTariffScheduleRepository,
    meters: InMemoryMeterRepository,
    bills: InMemoryBillRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn tariff_schedules(&self) -> &dyn TariffScheduleRepository {
        &self.tariff_schedules
    }

    fn meters(&self) -> &dyn MeterRepository {
        &self.meters
    }

    fn bills(&self) -> &dyn BillRepository {
        &self.bills
    }
}

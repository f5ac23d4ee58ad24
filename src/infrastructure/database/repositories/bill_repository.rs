//! SeaORM implementation of BillRepository

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::domain::bill::{Bill, BillRepository};
use crate::domain::meter::PaymentStatus;
use crate::domain::tariff::ChargeBreakdown;
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::bill;

pub struct SeaOrmBillRepository {
    db: DatabaseConnection,
}

impl SeaOrmBillRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Validation(format!("Database error: {}", e))
}

fn model_to_domain(b: bill::Model) -> Bill {
    Bill {
        id: b.id,
        meter_id: b.meter_id,
        billing_month: b.billing_month,
        period_start: b.period_start,
        period_end: b.period_end,
        previous_reading: b.previous_reading,
        current_reading: b.current_reading,
        usage_m3: b.usage_m3,
        difference_usage_m3: b.difference_usage_m3,
        breakdown: ChargeBreakdown {
            base_water_charge: b.base_water_charge,
            maintenance_fee: b.maintenance_fee,
            sanitation_fee: b.sanitation_fee,
            sewerage_charge: b.sewerage_charge,
            meter_rent: b.meter_rent,
            vat_amount: b.vat_amount,
            total: b.base_water_charge
                + b.maintenance_fee
                + b.sanitation_fee
                + b.sewerage_charge
                + b.meter_rent
                + b.vat_amount,
        },
        balance_carried_forward: b.balance_carried_forward,
        total_amount_due: b.total_amount_due,
        due_date: b.due_date,
        payment_status: b.payment_status.parse().unwrap_or(PaymentStatus::Unpaid),
        notes: b.notes,
        created_at: b.created_at,
    }
}

// ── BillRepository impl ─────────────────────────────────────────

#[async_trait]
impl BillRepository for SeaOrmBillRepository {
    async fn insert(&self, b: Bill) -> DomainResult<Bill> {
        if self.exists_for(&b.meter_id, &b.billing_month).await? {
            return Err(DomainError::Conflict(format!(
                "Bill for meter {} in {}",
                b.meter_id, b.billing_month
            )));
        }

        let model = bill::ActiveModel {
            id: NotSet,
            meter_id: Set(b.meter_id),
            billing_month: Set(b.billing_month),
            period_start: Set(b.period_start),
            period_end: Set(b.period_end),
            previous_reading: Set(b.previous_reading),
            current_reading: Set(b.current_reading),
            usage_m3: Set(b.usage_m3),
            difference_usage_m3: Set(b.difference_usage_m3),
            base_water_charge: Set(b.breakdown.base_water_charge),
            maintenance_fee: Set(b.breakdown.maintenance_fee),
            sanitation_fee: Set(b.breakdown.sanitation_fee),
            sewerage_charge: Set(b.breakdown.sewerage_charge),
            meter_rent: Set(b.breakdown.meter_rent),
            vat_amount: Set(b.breakdown.vat_amount),
            balance_carried_forward: Set(b.balance_carried_forward),
            total_amount_due: Set(b.total_amount_due),
            due_date: Set(b.due_date),
            payment_status: Set(b.payment_status.to_string()),
            notes: Set(b.notes),
            created_at: Set(Utc::now()),
        };

        let result = model.insert(&self.db).await.map_err(db_err)?;
        info!(
            "Bill {} inserted for meter {} ({}): total={}",
            result.id, result.meter_id, result.billing_month, result.total_amount_due
        );
        Ok(model_to_domain(result))
    }

    async fn delete(&self, id: i64) -> DomainResult<()> {
        let result = bill::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        // Idempotent: a bill that is already gone counts as deleted
        debug!("Bill {} delete: rows_affected={}", id, result.rows_affected);
        Ok(())
    }

    async fn exists_for(&self, meter_id: &str, billing_month: &str) -> DomainResult<bool> {
        let count = bill::Entity::find()
            .filter(bill::Column::MeterId.eq(meter_id))
            .filter(bill::Column::BillingMonth.eq(billing_month))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    async fn find_for_meter(&self, meter_id: &str) -> DomainResult<Vec<Bill>> {
        let models = bill::Entity::find()
            .filter(bill::Column::MeterId.eq(meter_id))
            .order_by_desc(bill::Column::BillingMonth)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}

//! SeaORM implementation of MeterRepository

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::meter::{CycleClose, MeterAccount, MeterRepository, PaymentStatus};
use crate::domain::tariff::CustomerType;
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::meter;

pub struct SeaOrmMeterRepository {
    db: DatabaseConnection,
}

impl SeaOrmMeterRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Validation(format!("Database error: {}", e))
}

fn model_to_domain(m: meter::Model) -> MeterAccount {
    MeterAccount {
        customer_type: m.customer_type.parse().unwrap_or(CustomerType::Domestic),
        payment_status: m.payment_status.parse().unwrap_or(PaymentStatus::Unpaid),
        id: m.id,
        meter_size_inches: m.meter_size_inches,
        sewerage_connection: m.sewerage_connection,
        is_bulk: m.is_bulk,
        bulk_meter_id: m.bulk_meter_id,
        previous_reading: m.previous_reading,
        current_reading: m.current_reading,
        outstanding_balance: m.outstanding_balance,
        billing_month: m.billing_month,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn domain_to_active(m: MeterAccount) -> meter::ActiveModel {
    meter::ActiveModel {
        id: Set(m.id),
        customer_type: Set(m.customer_type.to_string()),
        meter_size_inches: Set(m.meter_size_inches),
        sewerage_connection: Set(m.sewerage_connection),
        is_bulk: Set(m.is_bulk),
        bulk_meter_id: Set(m.bulk_meter_id),
        previous_reading: Set(m.previous_reading),
        current_reading: Set(m.current_reading),
        outstanding_balance: Set(m.outstanding_balance),
        payment_status: Set(m.payment_status.to_string()),
        billing_month: Set(m.billing_month),
        created_at: Set(m.created_at),
        updated_at: Set(m.updated_at),
    }
}

// ── MeterRepository impl ────────────────────────────────────────

#[async_trait]
impl MeterRepository for SeaOrmMeterRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<MeterAccount>> {
        let model = meter::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_assigned_to(&self, bulk_meter_id: &str) -> DomainResult<Vec<MeterAccount>> {
        let models = meter::Entity::find()
            .filter(meter::Column::BulkMeterId.eq(bulk_meter_id))
            .order_by_asc(meter::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_bulk_meters(&self) -> DomainResult<Vec<MeterAccount>> {
        let models = meter::Entity::find()
            .filter(meter::Column::IsBulk.eq(true))
            .order_by_asc(meter::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn save(&self, mut meter_account: MeterAccount) -> DomainResult<MeterAccount> {
        meter_account.updated_at = Utc::now();

        let existing = meter::Entity::find_by_id(&meter_account.id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let model = domain_to_active(meter_account);
        let result = if existing.is_some() {
            model.update(&self.db).await.map_err(db_err)?
        } else {
            model.insert(&self.db).await.map_err(db_err)?
        };

        info!("Meter saved: {}", result.id);
        Ok(model_to_domain(result))
    }

    async fn close_cycle(&self, close: CycleClose) -> DomainResult<()> {
        debug!(
            "Closing cycle on meter {} at reading {}",
            close.meter_id, close.expected_current_reading
        );

        // Conditional update: only commits when the stored reading still
        // matches the snapshot the closure computed from.
        let result = meter::Entity::update_many()
            .col_expr(
                meter::Column::PreviousReading,
                Expr::value(close.expected_current_reading),
            )
            .col_expr(
                meter::Column::OutstandingBalance,
                Expr::value(close.new_outstanding_balance),
            )
            .col_expr(
                meter::Column::PaymentStatus,
                Expr::value(close.payment_status.to_string()),
            )
            .col_expr(meter::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(meter::Column::Id.eq(close.meter_id.clone()))
            .filter(meter::Column::CurrentReading.eq(close.expected_current_reading))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            // Distinguish a missing meter from a reading that moved
            let existing = meter::Entity::find_by_id(&close.meter_id)
                .one(&self.db)
                .await
                .map_err(db_err)?;
            return match existing {
                None => Err(DomainError::NotFound {
                    entity: "Meter",
                    field: "id",
                    value: close.meter_id,
                }),
                Some(m) => Err(DomainError::StaleState(format!(
                    "Meter {} reading moved to {} (closure computed from {})",
                    close.meter_id, m.current_reading, close.expected_current_reading
                ))),
            };
        }
        Ok(())
    }
}

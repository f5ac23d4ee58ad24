//! SeaORM implementation of TariffScheduleRepository plus a read-through cache

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use log::{info, warn};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::tariff::{
    CustomerType, RentBracket, TariffSchedule, TariffScheduleRepository, Tier,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::tariff_schedule;

// ── Conversion helpers ──────────────────────────────────────────

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Validation(format!("Database error: {}", e))
}

/// Parse a JSON tier table. Malformed rows make the whole column unusable,
/// so a parse failure degrades to an empty table with a logged warning
/// rather than failing the lookup.
fn parse_tiers(raw: &str, context: &str) -> Vec<Tier> {
    match serde_json::from_str(raw) {
        Ok(tiers) => tiers,
        Err(e) => {
            warn!("Unparseable tier table for {}: {}", context, e);
            Vec::new()
        }
    }
}

fn parse_brackets(raw: &str, context: &str) -> Vec<RentBracket> {
    match serde_json::from_str(raw) {
        Ok(brackets) => brackets,
        Err(e) => {
            warn!("Unparseable rent brackets for {}: {}", context, e);
            Vec::new()
        }
    }
}

fn model_to_domain(m: tariff_schedule::Model) -> TariffSchedule {
    let context = format!("{}/{}", m.customer_type, m.year);
    TariffSchedule {
        customer_type: m
            .customer_type
            .parse()
            .unwrap_or(CustomerType::Domestic),
        year: m.year,
        tiers: parse_tiers(&m.tiers, &context),
        sewerage_tiers: parse_tiers(&m.sewerage_tiers, &context),
        maintenance_percentage: m.maintenance_percentage,
        sanitation_percentage: m.sanitation_percentage,
        meter_rent_brackets: parse_brackets(&m.meter_rent_brackets, &context),
        vat_rate: m.vat_rate,
        domestic_vat_threshold_m3: m.domestic_vat_threshold_m3,
    }
}

// ── SeaOrmTariffScheduleRepository ──────────────────────────────

pub struct SeaOrmTariffScheduleRepository {
    db: DatabaseConnection,
}

impl SeaOrmTariffScheduleRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TariffScheduleRepository for SeaOrmTariffScheduleRepository {
    async fn find(
        &self,
        customer_type: CustomerType,
        year: i32,
    ) -> DomainResult<Option<TariffSchedule>> {
        let model = tariff_schedule::Entity::find()
            .filter(tariff_schedule::Column::CustomerType.eq(customer_type.to_string()))
            .filter(tariff_schedule::Column::Year.eq(year))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<TariffSchedule>> {
        let models = tariff_schedule::Entity::find()
            .order_by_asc(tariff_schedule::Column::CustomerType)
            .order_by_asc(tariff_schedule::Column::Year)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn save(&self, schedule: TariffSchedule) -> DomainResult<TariffSchedule> {
        schedule.validate()?;

        let tiers = serde_json::to_string(&schedule.tiers)
            .map_err(|e| DomainError::Validation(format!("Unserializable tiers: {}", e)))?;
        let sewerage_tiers = serde_json::to_string(&schedule.sewerage_tiers)
            .map_err(|e| DomainError::Validation(format!("Unserializable tiers: {}", e)))?;
        let brackets = serde_json::to_string(&schedule.meter_rent_brackets)
            .map_err(|e| DomainError::Validation(format!("Unserializable brackets: {}", e)))?;

        let existing = tariff_schedule::Entity::find()
            .filter(tariff_schedule::Column::CustomerType.eq(schedule.customer_type.to_string()))
            .filter(tariff_schedule::Column::Year.eq(schedule.year))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let now = Utc::now();
        let result = match existing {
            Some(row) => {
                let mut model: tariff_schedule::ActiveModel = row.into();
                model.tiers = Set(tiers);
                model.sewerage_tiers = Set(sewerage_tiers);
                model.maintenance_percentage = Set(schedule.maintenance_percentage);
                model.sanitation_percentage = Set(schedule.sanitation_percentage);
                model.meter_rent_brackets = Set(brackets);
                model.vat_rate = Set(schedule.vat_rate);
                model.domestic_vat_threshold_m3 = Set(schedule.domestic_vat_threshold_m3);
                model.updated_at = Set(now);
                model.update(&self.db).await.map_err(db_err)?
            }
            None => {
                let model = tariff_schedule::ActiveModel {
                    customer_type: Set(schedule.customer_type.to_string()),
                    year: Set(schedule.year),
                    tiers: Set(tiers),
                    sewerage_tiers: Set(sewerage_tiers),
                    maintenance_percentage: Set(schedule.maintenance_percentage),
                    sanitation_percentage: Set(schedule.sanitation_percentage),
                    meter_rent_brackets: Set(brackets),
                    vat_rate: Set(schedule.vat_rate),
                    domestic_vat_threshold_m3: Set(schedule.domestic_vat_threshold_m3),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                model.insert(&self.db).await.map_err(db_err)?
            }
        };

        info!(
            "Tariff schedule saved: {}/{}",
            result.customer_type, result.year
        );
        Ok(model_to_domain(result))
    }

    async fn refresh(&self) -> DomainResult<()> {
        // No local state to drop
        Ok(())
    }
}

// ── CachingTariffScheduleRepository ─────────────────────────────

/// Read-through cache in front of a schedule store.
///
/// Schedules change a few times a year while pricing reads one per meter,
/// so lookups are served from memory after the first hit. `save` updates
/// the cached entry and `refresh` drops everything.
pub struct CachingTariffScheduleRepository {
    inner: Arc<dyn TariffScheduleRepository>,
    cache: DashMap<(CustomerType, i32), TariffSchedule>,
}

impl CachingTariffScheduleRepository {
    pub fn new(inner: Arc<dyn TariffScheduleRepository>) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }
}

#[async_trait]
impl TariffScheduleRepository for CachingTariffScheduleRepository {
    async fn find(
        &self,
        customer_type: CustomerType,
        year: i32,
    ) -> DomainResult<Option<TariffSchedule>> {
        if let Some(cached) = self.cache.get(&(customer_type, year)) {
            return Ok(Some(cached.clone()));
        }

        let schedule = self.inner.find(customer_type, year).await?;
        if let Some(ref s) = schedule {
            self.cache.insert((customer_type, year), s.clone());
        }
        Ok(schedule)
    }

    async fn find_all(&self) -> DomainResult<Vec<TariffSchedule>> {
        self.inner.find_all().await
    }

    async fn save(&self, schedule: TariffSchedule) -> DomainResult<TariffSchedule> {
        let saved = self.inner.save(schedule).await?;
        self.cache
            .insert((saved.customer_type, saved.year), saved.clone());
        Ok(saved)
    }

    async fn refresh(&self) -> DomainResult<()> {
        self.cache.clear();
        self.inner.refresh().await
    }
}

// ── Tests ──────────────────────────────────────────────────────

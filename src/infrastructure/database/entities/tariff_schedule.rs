//! Tariff schedule entity
//!
//! Tier tables and rent brackets are stored as JSON text so the same column
//! can hold whatever shape upstream imports produce; normalization to the
//! domain shape happens in the repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tariff schedule model - the rate table for one (customer type, year)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tariff_schedules")]
pub struct Model {
    /// Unique schedule ID
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Customer type the schedule applies to ("Domestic", "Commercial", ...)
    pub customer_type: String,

    /// Tariff year the schedule is versioned by
    pub year: i32,

    /// Water usage tiers as JSON
    #[sea_orm(column_type = "Text")]
    pub tiers: String,

    /// Sewerage usage tiers as JSON
    #[sea_orm(column_type = "Text")]
    pub sewerage_tiers: String,

    /// Maintenance fee as a fraction of the base water charge
    pub maintenance_percentage: Decimal,

    /// Sanitation fee as a fraction of the base water charge
    pub sanitation_percentage: Decimal,

    /// Meter rent brackets as JSON
    #[sea_orm(column_type = "Text")]
    pub meter_rent_brackets: String,

    /// VAT rate as a fraction of the charge subtotal
    pub vat_rate: Decimal,

    /// Domestic usage at or below this is VAT exempt
    pub domestic_vat_threshold_m3: Decimal,

    /// When the schedule was created
    pub created_at: DateTime<Utc>,

    /// When the schedule was last updated
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

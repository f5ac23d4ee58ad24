//! Meter account entity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Meter model - a bulk meter or an individual customer meter
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meters")]
pub struct Model {
    /// Meter identifier (e.g., "BM-001")
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Customer type ("Domestic", "Commercial", ...)
    pub customer_type: String,

    /// Nominal meter size in inches
    pub meter_size_inches: Decimal,

    /// Whether the customer has an active sewerage connection
    pub sewerage_connection: bool,

    /// Whether this is a bulk meter feeding individual meters
    pub is_bulk: bool,

    /// For individual meters, the bulk meter they are fed from
    pub bulk_meter_id: Option<String>,

    /// Reading the last closed cycle ended at
    pub previous_reading: Decimal,

    /// Latest submitted reading
    pub current_reading: Decimal,

    /// Unpaid amount carried from earlier cycles
    pub outstanding_balance: Decimal,

    /// "Paid" or "Unpaid"
    pub payment_status: String,

    /// Current billing month in "YYYY-MM" form
    pub billing_month: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! Bill ledger entity
//!
//! Append-only; rows are inserted by cycle closure and removed only by the
//! saga's compensating delete. The charge breakdown is flattened into
//! columns so reports can aggregate without JSON parsing.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub meter_id: String,

    /// Billing month in "YYYY-MM" form; unique together with meter_id
    pub billing_month: String,

    pub period_start: NaiveDate,

    pub period_end: NaiveDate,

    pub previous_reading: Decimal,

    pub current_reading: Decimal,

    pub usage_m3: Decimal,

    /// Reconciled bulk-vs-individual difference the charge was priced on
    pub difference_usage_m3: Decimal,

    pub base_water_charge: Decimal,

    pub maintenance_fee: Decimal,

    pub sanitation_fee: Decimal,

    pub sewerage_charge: Decimal,

    pub meter_rent: Decimal,

    pub vat_amount: Decimal,

    /// Unpaid amount from earlier cycles rolled into this bill
    pub balance_carried_forward: Decimal,

    pub total_amount_due: Decimal,

    pub due_date: NaiveDate,

    /// "Paid" or "Unpaid"
    pub payment_status: String,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

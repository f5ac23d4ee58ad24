//! Bill ledger entry
//!
//! Append-only: created once per (meter, billing month) by cycle closure and
//! never mutated afterwards. The only delete path is the saga's
//! compensating rollback.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::domain::meter::{BillingMonth, MeterAccount, PaymentStatus};
use crate::domain::tariff::ChargeBreakdown;

#[derive(Debug, Clone, PartialEq)]
pub struct Bill {
    /// Assigned by the ledger on insert; 0 before persistence
    pub id: i64,
    pub meter_id: String,
    pub billing_month: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub previous_reading: Decimal,
    pub current_reading: Decimal,
    pub usage_m3: Decimal,
    /// Reconciled bulk-vs-individual difference the charge was priced on
    pub difference_usage_m3: Decimal,
    pub breakdown: ChargeBreakdown,
    /// Unpaid amount from earlier cycles rolled into this bill
    pub balance_carried_forward: Decimal,
    pub total_amount_due: Decimal,
    pub due_date: NaiveDate,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    /// Assemble the ledger entry for one closed cycle
    pub fn for_cycle(
        meter: &MeterAccount,
        month: BillingMonth,
        difference_usage_m3: Decimal,
        breakdown: ChargeBreakdown,
        total_amount_due: Decimal,
    ) -> Self {
        Self {
            id: 0,
            meter_id: meter.id.clone(),
            billing_month: month.to_string(),
            period_start: month.period_start(),
            period_end: month.period_end(),
            previous_reading: meter.previous_reading,
            current_reading: meter.current_reading,
            usage_m3: meter.usage(),
            difference_usage_m3,
            balance_carried_forward: meter.outstanding_balance,
            total_amount_due,
            due_date: month.due_date(),
            payment_status: PaymentStatus::Unpaid,
            notes: None,
            breakdown,
            created_at: Utc::now(),
        }
    }
}

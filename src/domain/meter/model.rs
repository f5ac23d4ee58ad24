//! Meter account domain entity
//!
//! A meter account is either a bulk meter feeding a group of individually
//! metered customers, or one of those individual meters. Readings only ever
//! advance; cycle closure rolls `previous_reading` forward and resets or
//! carries the outstanding balance.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::domain::tariff::CustomerType;
use crate::shared::errors::DomainError;

/// Payment status of a meter account or bill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        Self::Unpaid
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paid => write!(f, "Paid"),
            Self::Unpaid => write!(f, "Unpaid"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Paid" => Ok(Self::Paid),
            "Unpaid" => Ok(Self::Unpaid),
            other => Err(DomainError::Validation(format!(
                "Unknown payment status: {other}"
            ))),
        }
    }
}

/// A calendar billing period, parsed from the `"YYYY-MM"` form the meter
/// account carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingMonth {
    pub year: i32,
    pub month: u32,
}

/// Grace period between period end and the bill's due date
const DUE_DAYS: i64 = 15;

impl BillingMonth {
    pub fn period_start(&self) -> NaiveDate {
        // month is validated at parse time
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("validated billing month")
    }

    pub fn period_end(&self) -> NaiveDate {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1).expect("validated billing month")
            - Duration::days(1)
    }

    pub fn due_date(&self) -> NaiveDate {
        self.period_end() + Duration::days(DUE_DAYS)
    }
}

impl std::fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for BillingMonth {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::Validation(format!("Invalid billing month: {s:?}"));

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

/// Meter account: a bulk meter or an individual customer meter
#[derive(Debug, Clone, PartialEq)]
pub struct MeterAccount {
    pub id: String,
    pub customer_type: CustomerType,
    /// Nominal meter size in inches (e.g. 0.5, 0.75, 2, 4)
    pub meter_size_inches: Decimal,
    pub sewerage_connection: bool,
    pub is_bulk: bool,
    /// For individual meters, the bulk meter they are fed from
    pub bulk_meter_id: Option<String>,
    pub previous_reading: Decimal,
    pub current_reading: Decimal,
    pub outstanding_balance: Decimal,
    pub payment_status: PaymentStatus,
    /// Current billing month in `"YYYY-MM"` form; unset until first assigned
    pub billing_month: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MeterAccount {
    /// Usage for the open period
    pub fn usage(&self) -> Decimal {
        self.current_reading - self.previous_reading
    }

    /// Advance the current reading.
    ///
    /// A regression (new reading below the current one) is rejected, never
    /// silently clamped.
    pub fn submit_reading(&mut self, new_reading: Decimal) -> Result<(), DomainError> {
        if new_reading < self.current_reading {
            return Err(DomainError::Validation(format!(
                "Reading regression on meter {}: {} < {}",
                self.id, new_reading, self.current_reading
            )));
        }
        self.current_reading = new_reading;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Parse the assigned billing month, if any
    pub fn parsed_billing_month(&self) -> Option<BillingMonth> {
        self.billing_month.as_deref()?.parse().ok()
    }
}

// ── Tests ──────────────────────────────────────────────────────

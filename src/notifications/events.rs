//! Billing events
//!
//! Defines the events the billing core broadcasts to subscribers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A billing cycle was closed and its bill persisted
    CycleClosed(CycleClosedEvent),
    /// A cycle closure failed after bill persistence and was rolled back
    CycleCompensated(CycleCompensatedEvent),
    /// The compensating delete itself failed; the bill is orphaned and the
    /// meter needs manual reconciliation
    CompensationFailed(CompensationFailedEvent),
    /// Pricing degraded to a zero bill because no tariff schedule was found
    TariffMissing(TariffMissingEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::CycleClosed(_) => "cycle_closed",
            Event::CycleCompensated(_) => "cycle_compensated",
            Event::CompensationFailed(_) => "compensation_failed",
            Event::TariffMissing(_) => "tariff_missing",
        }
    }

    /// Get the meter ID if applicable
    pub fn meter_id(&self) -> Option<&str> {
        match self {
            Event::CycleClosed(e) => Some(&e.meter_id),
            Event::CycleCompensated(e) => Some(&e.meter_id),
            Event::CompensationFailed(e) => Some(&e.meter_id),
            Event::TariffMissing(_) => None,
        }
    }

    /// Whether the event must reach an operator (never drop silently)
    pub fn is_alert(&self) -> bool {
        matches!(self, Event::CompensationFailed(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleClosedEvent {
    pub meter_id: String,
    pub billing_month: String,
    pub bill_id: i64,
    pub difference_usage_m3: Decimal,
    pub total_amount_due: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleCompensatedEvent {
    pub meter_id: String,
    pub billing_month: String,
    pub deleted_bill_id: i64,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationFailedEvent {
    pub meter_id: String,
    pub billing_month: String,
    pub orphaned_bill_id: i64,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffMissingEvent {
    pub customer_type: String,
    pub year: i32,
    pub timestamp: DateTime<Utc>,
}

/// Envelope with a unique id for deduplication by consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

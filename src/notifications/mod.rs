//! Notifications module
//!
//! Broadcast billing events to in-process subscribers (alerting hooks,
//! dashboards, tests). Subscribe with [`EventBus::subscribe`]; dropping the
//! returned [`EventSubscriber`] unsubscribes.

pub mod event_bus;
pub mod events;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use events::*;

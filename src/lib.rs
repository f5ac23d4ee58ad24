//! # AquaBill Billing Core
//!
//! Billing engine for a water utility operating bulk meters with
//! individually metered customers behind them.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Core business entities, types and traits
//! - **application**: Pricing, cycle closure and batch services
//! - **infrastructure**: External concerns (database, in-memory storage)
//! - **notifications**: Billing event bus for alerting consumers
//! - **shared**: Errors, retry and shutdown plumbing

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod notifications;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};

// Re-export notifications
pub use notifications::{create_event_bus, Event, EventBus, SharedEventBus};

//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider` — unified access to all per-aggregate repositories
//! - `DomainResult` — standard result type for domain operations

use super::bill::BillRepository;
use super::meter::MeterRepository;
use super::tariff::TariffScheduleRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let meter = repos.meters().find_by_id("BM-001").await?;
///     let bills = repos.bills().find_for_meter("BM-001").await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn tariff_schedules(&self) -> &dyn TariffScheduleRepository;
    fn meters(&self) -> &dyn MeterRepository;
    fn bills(&self) -> &dyn BillRepository;
}

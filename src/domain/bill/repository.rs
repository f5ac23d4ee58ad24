//! Bill ledger repository interface

use async_trait::async_trait;

use super::model::Bill;
use crate::domain::DomainResult;

#[async_trait]
pub trait BillRepository: Send + Sync {
    /// Append a bill to the ledger, returning it with its assigned id
    async fn insert(&self, bill: Bill) -> DomainResult<Bill>;

    /// Compensating delete. Idempotent: deleting a bill that is already gone
    /// succeeds, so a retried compensation is safe.
    async fn delete(&self, id: i64) -> DomainResult<()>;

    /// Whether a bill already exists for (meter, billing month)
    async fn exists_for(&self, meter_id: &str, billing_month: &str) -> DomainResult<bool>;

    async fn find_for_meter(&self, meter_id: &str) -> DomainResult<Vec<Bill>>;
}

//! Subscription repository port.

use async_trait::async_trait;

use crate::domain::access::SubscriptionRecord;
use crate::domain::foundation::{DomainError, TenantId};

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Every record referencing the tenant, ordered by `startDate` ascending.
    ///
    /// Records with an unrecognized status label are skipped by the adapter.
    async fn list_for_tenant(&self, tenant_id: &TenantId) -> Result<Vec<SubscriptionRecord>, DomainError>;

    /// Persist a new subscription record.
    async fn insert(&self, record: &SubscriptionRecord) -> Result<(), DomainError>;
}

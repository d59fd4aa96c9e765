//! Plan reader port (read-only).

use async_trait::async_trait;

use crate::domain::access::SubscriptionPlan;
use crate::domain::foundation::{DomainError, PlanId};

#[async_trait]
pub trait PlanReader: Send + Sync {
    /// Returns `None` if no plan with this ID exists.
    async fn find_by_id(&self, id: &PlanId) -> Result<Option<SubscriptionPlan>, DomainError>;
}

//! Trial configuration store port.
//!
//! One [`TrialPeriodsConfig`] document per scope. A scope is either a
//! tenant's own ID or the single global fallback scope.

use async_trait::async_trait;

use crate::domain::access::TrialPeriodsConfig;
use crate::domain::foundation::{DomainError, ScopeId};

#[async_trait]
pub trait TrialConfigStore: Send + Sync {
    /// Returns `None` when the scope has no config document.
    async fn find_by_scope(&self, scope: &ScopeId) -> Result<Option<TrialPeriodsConfig>, DomainError>;

    /// Replace the scope's config document.
    async fn save(&self, scope: &ScopeId, config: &TrialPeriodsConfig) -> Result<(), DomainError>;
}

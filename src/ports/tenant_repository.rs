//! Tenant repository port.
//!
//! Tenants are read whole but only ever written through field-level merges
//! ([`TenantPatch`]). There is no full-document update on purpose: the
//! resolver's self-heal and lifecycle operations may race, and a merge that
//! touches only its own fields keeps both writes intact.

use async_trait::async_trait;

use crate::domain::access::{Tenant, TenantPatch};
use crate::domain::foundation::{DomainError, TenantId};

#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Find a tenant by ID, with stored instants normalized.
    ///
    /// Returns `None` if the tenant doesn't exist.
    async fn find_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DomainError>;

    /// Persist a newly onboarded tenant.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if a tenant with the same ID exists
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, tenant: &Tenant) -> Result<(), DomainError>;

    /// Merge the patch into the stored document as one atomic write.
    ///
    /// Returns `false` when no tenant with this ID exists.
    async fn apply_patch(&self, id: &TenantId, patch: &TenantPatch) -> Result<bool, DomainError>;

    /// All tenants whose stored `isInTrial` flag is true.
    async fn list_in_trial(&self) -> Result<Vec<Tenant>, DomainError>;
}

//! ReapplyTrialDefinitionHandler - Recomputes running trials after a config change.
//!
//! Every tenant currently in trial gets `trialEndDate = (trialStartDate or
//! now) + active definition`, and the definition used is recorded on the
//! tenant. Nothing is touched when no definition resolves for the scope.

use std::sync::Arc;

use crate::domain::access::{compute_end_instant, AccessError, TenantPatch, TrialProvenance};
use crate::domain::foundation::ScopeId;
use crate::ports::{Clock, TenantRepository};

use super::{ResolveTrialDefinitionHandler, ResolveTrialDefinitionQuery};

#[derive(Debug, Clone)]
pub struct ReapplyTrialDefinitionCommand {
    pub scope_id: ScopeId,
}

/// Number of tenants whose trial window was rewritten.
pub type ReapplyTrialDefinitionResult = usize;

pub struct ReapplyTrialDefinitionHandler {
    tenants: Arc<dyn TenantRepository>,
    definitions: Arc<ResolveTrialDefinitionHandler>,
    clock: Arc<dyn Clock>,
}

impl ReapplyTrialDefinitionHandler {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        definitions: Arc<ResolveTrialDefinitionHandler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tenants,
            definitions,
            clock,
        }
    }

    pub async fn handle(
        &self,
        cmd: ReapplyTrialDefinitionCommand,
    ) -> Result<ReapplyTrialDefinitionResult, AccessError> {
        let Some(resolved) = self
            .definitions
            .handle(ResolveTrialDefinitionQuery {
                scope_id: cmd.scope_id.clone(),
            })
            .await?
        else {
            tracing::info!(scope = %cmd.scope_id, "no active trial definition, nothing reapplied");
            return Ok(0);
        };

        let now = self.clock.now();
        let provenance =
            TrialProvenance::from_definition(&resolved.definition, resolved.source, resolved.scope_id, now);

        let mut updated = 0;
        for tenant in self.tenants.list_in_trial().await? {
            let start = tenant.trial_start_date.unwrap_or(now);
            let end = compute_end_instant(start, resolved.definition.days, resolved.definition.minutes);
            if self
                .tenants
                .apply_patch(&tenant.id, &TenantPatch::reapplied(end, provenance.clone()))
                .await?
            {
                updated += 1;
            }
        }

        tracing::info!(
            scope = %cmd.scope_id,
            definition = %resolved.definition.id,
            updated,
            "trial definition reapplied"
        );
        Ok(updated)
    }
}

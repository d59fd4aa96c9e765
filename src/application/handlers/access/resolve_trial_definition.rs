//! ResolveTrialDefinitionHandler - Which trial definition applies to a scope.
//!
//! Lookup order:
//! 1. The scope's own config document.
//! 2. The global fallback scope, only when the scope has no document at all.
//!
//! Inside a document the definition is picked by
//! [`TrialPeriodsConfig::active_definition`]. A document that exists but has
//! trials disabled, or no definitions, resolves to `None` without falling
//! back; callers then use the built-in default duration.

use std::sync::Arc;

use crate::domain::access::{
    AccessError, ConfigSource, TrialPeriodDefinition, TrialProvenance, DEFAULT_TRIAL_DAYS,
    DEFAULT_TRIAL_MINUTES,
};
use crate::domain::foundation::{EpochMillis, ScopeId};
use crate::ports::TrialConfigStore;

/// Query for the definition active in a scope.
#[derive(Debug, Clone)]
pub struct ResolveTrialDefinitionQuery {
    pub scope_id: ScopeId,
}

/// A definition together with where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDefinition {
    pub definition: TrialPeriodDefinition,
    pub source: ConfigSource,
    pub scope_id: ScopeId,
}

/// Duration used when no definition resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialDefaults {
    pub days: u32,
    pub minutes: u32,
}

impl Default for TrialDefaults {
    fn default() -> Self {
        Self {
            days: DEFAULT_TRIAL_DAYS,
            minutes: DEFAULT_TRIAL_MINUTES,
        }
    }
}

/// Duration to apply to a new trial, with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialDuration {
    pub days: u32,
    pub minutes: u32,
    pub provenance: TrialProvenance,
}

pub struct ResolveTrialDefinitionHandler {
    configs: Arc<dyn TrialConfigStore>,
    global_scope: ScopeId,
    defaults: TrialDefaults,
}

impl ResolveTrialDefinitionHandler {
    pub fn new(configs: Arc<dyn TrialConfigStore>, global_scope: ScopeId) -> Self {
        Self {
            configs,
            global_scope,
            defaults: TrialDefaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: TrialDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn global_scope(&self) -> &ScopeId {
        &self.global_scope
    }

    pub async fn handle(
        &self,
        query: ResolveTrialDefinitionQuery,
    ) -> Result<Option<ResolvedDefinition>, AccessError> {
        let scope = query.scope_id;

        if let Some(config) = self.configs.find_by_scope(&scope).await? {
            let source = if scope == self.global_scope {
                ConfigSource::GlobalScope
            } else {
                ConfigSource::TenantScope
            };
            return Ok(config.active_definition().cloned().map(|definition| ResolvedDefinition {
                definition,
                source,
                scope_id: scope,
            }));
        }

        if scope == self.global_scope {
            return Ok(None);
        }

        tracing::debug!(scope = %scope, global_scope = %self.global_scope, "no trial config for scope, trying global");

        let global = self.configs.find_by_scope(&self.global_scope).await?;
        Ok(global.and_then(|config| {
            config.active_definition().cloned().map(|definition| ResolvedDefinition {
                definition,
                source: ConfigSource::GlobalScope,
                scope_id: self.global_scope.clone(),
            })
        }))
    }

    /// Duration for a new trial in `scope`, falling back to the defaults.
    pub async fn duration_for(&self, scope: &ScopeId, now: EpochMillis) -> Result<TrialDuration, AccessError> {
        let resolved = self
            .handle(ResolveTrialDefinitionQuery {
                scope_id: scope.clone(),
            })
            .await?;

        Ok(match resolved {
            Some(resolved) => TrialDuration {
                days: resolved.definition.days,
                minutes: resolved.definition.minutes,
                provenance: TrialProvenance::from_definition(
                    &resolved.definition,
                    resolved.source,
                    resolved.scope_id,
                    now,
                ),
            },
            None => {
                tracing::debug!(scope = %scope, days = self.defaults.days, "no trial definition resolved, using default");
                TrialDuration {
                    days: self.defaults.days,
                    minutes: self.defaults.minutes,
                    provenance: TrialProvenance {
                        duration_days: self.defaults.days,
                        duration_minutes: self.defaults.minutes,
                        ..TrialProvenance::builtin_default(now)
                    },
                }
            }
        })
    }
}

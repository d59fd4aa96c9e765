//! Trial-period definitions, their per-scope configuration, and provenance.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::foundation::{EpochMillis, ScopeId, ValidationError};

/// Trial length used when no definition resolves.
pub const DEFAULT_TRIAL_DAYS: u32 = 30;
pub const DEFAULT_TRIAL_MINUTES: u32 = 0;

/// Declared default id assumed when a config does not name one.
pub const DEFAULT_ACTIVE_TRIAL_ID: &str = "1";

/// Upper bound accepted when saving a definition (ten years).
pub const MAX_TRIAL_DAYS: u32 = 3_650;

/// Upper bound on the minute component (one day).
pub const MAX_TRIAL_MINUTES: u32 = 1_440;

/// A named trial duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialPeriodDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub days: u32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub is_active: bool,
}

/// Trial configuration for one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialPeriodsConfig {
    /// Master switch. Missing means enabled.
    #[serde(default = "default_enable_trials")]
    pub enable_trials: bool,

    #[serde(default)]
    pub active_trial_id: Option<String>,

    #[serde(default)]
    pub trial_periods: Vec<TrialPeriodDefinition>,
}

fn default_enable_trials() -> bool {
    true
}

impl TrialPeriodsConfig {
    pub fn declared_default_id(&self) -> &str {
        self.active_trial_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_ACTIVE_TRIAL_ID)
    }

    /// Definition that currently applies, first match wins:
    /// a flagged definition, then the declared default id, then the first
    /// declared definition. `None` when trials are disabled or none exist.
    pub fn active_definition(&self) -> Option<&TrialPeriodDefinition> {
        if !self.enable_trials {
            return None;
        }
        let declared = self.declared_default_id();
        self.trial_periods
            .iter()
            .find(|d| d.is_active)
            .or_else(|| self.trial_periods.iter().find(|d| d.id == declared))
            .or_else(|| self.trial_periods.first())
    }

    /// Checks a config before it is persisted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for definition in &self.trial_periods {
            if definition.id.trim().is_empty() {
                return Err(ValidationError::empty_field("trialPeriods.id"));
            }
            if !seen.insert(definition.id.as_str()) {
                return Err(ValidationError::invalid_format(
                    "trialPeriods.id",
                    format!("duplicate id '{}'", definition.id),
                ));
            }
            if definition.days > MAX_TRIAL_DAYS {
                return Err(ValidationError::out_of_range(
                    "trialPeriods.days",
                    0,
                    MAX_TRIAL_DAYS as i64,
                    definition.days as i64,
                ));
            }
            if definition.minutes > MAX_TRIAL_MINUTES {
                return Err(ValidationError::out_of_range(
                    "trialPeriods.minutes",
                    0,
                    MAX_TRIAL_MINUTES as i64,
                    definition.minutes as i64,
                ));
            }
        }
        if self.trial_periods.iter().filter(|d| d.is_active).count() > 1 {
            return Err(ValidationError::invalid_format(
                "trialPeriods.isActive",
                "at most one definition may be flagged active",
            ));
        }
        Ok(())
    }
}

/// Where the applied trial duration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    TenantScope,
    GlobalScope,
    BuiltInDefault,
}

/// Audit record of the definition a trial window was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialProvenance {
    pub source: ConfigSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_id: Option<ScopeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_name: Option<String>,
    pub duration_days: u32,
    pub duration_minutes: u32,
    pub applied_at: EpochMillis,
}

impl TrialProvenance {
    pub fn from_definition(
        definition: &TrialPeriodDefinition,
        source: ConfigSource,
        scope_id: ScopeId,
        applied_at: EpochMillis,
    ) -> Self {
        Self {
            source,
            scope_id: Some(scope_id),
            config_id: Some(definition.id.clone()),
            period_name: Some(definition.name.clone()).filter(|n| !n.is_empty()),
            duration_days: definition.days,
            duration_minutes: definition.minutes,
            applied_at,
        }
    }

    pub fn builtin_default(applied_at: EpochMillis) -> Self {
        Self {
            source: ConfigSource::BuiltInDefault,
            scope_id: None,
            config_id: None,
            period_name: None,
            duration_days: DEFAULT_TRIAL_DAYS,
            duration_minutes: DEFAULT_TRIAL_MINUTES,
            applied_at,
        }
    }
}

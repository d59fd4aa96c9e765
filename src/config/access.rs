//! Access engine tunables

use serde::Deserialize;
use std::time::Duration;

use crate::domain::access::{NoticeWindows, MAX_TRIAL_DAYS, MAX_TRIAL_MINUTES};
use crate::domain::foundation::ScopeId;

use super::error::ValidationError;

/// Every field has a default, so the whole section may be omitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Scope consulted when a tenant scope has no trial config
    pub global_scope_id: String,

    /// Trial length used when no definition resolves
    pub default_trial_days: u32,
    pub default_trial_minutes: u32,

    pub closing_soon_window_days: u32,
    pub final_notice_window_days: u32,

    pub guard_poll_interval_secs: u64,
    pub sweep_interval_secs: u64,

    /// Where enforcement sends the signed-out user
    pub landing_route: String,
}

impl AccessConfig {
    pub fn global_scope(&self) -> Result<ScopeId, ValidationError> {
        ScopeId::new(self.global_scope_id.clone()).map_err(|_| ValidationError::InvalidGlobalScope)
    }

    pub fn notice_windows(&self) -> NoticeWindows {
        NoticeWindows {
            closing_soon_days: self.closing_soon_window_days,
            final_days: self.final_notice_window_days,
        }
    }

    pub fn guard_poll_interval(&self) -> Duration {
        Duration::from_secs(self.guard_poll_interval_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.global_scope()?;
        if self.default_trial_days > MAX_TRIAL_DAYS || self.default_trial_minutes > MAX_TRIAL_MINUTES {
            return Err(ValidationError::InvalidTrialDuration);
        }
        if self.final_notice_window_days > self.closing_soon_window_days {
            return Err(ValidationError::InvalidNoticeWindows);
        }
        if self.guard_poll_interval_secs == 0 {
            return Err(ValidationError::InvalidInterval("access.guard_poll_interval_secs"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::InvalidInterval("access.sweep_interval_secs"));
        }
        if self.landing_route.trim().is_empty() {
            return Err(ValidationError::InvalidLandingRoute);
        }
        Ok(())
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            global_scope_id: "admin".to_string(),
            default_trial_days: 30,
            default_trial_minutes: 0,
            closing_soon_window_days: 3,
            final_notice_window_days: 1,
            guard_poll_interval_secs: 600,
            sweep_interval_secs: 3600,
            landing_route: "/#/subscription-plans".to_string(),
        }
    }
}

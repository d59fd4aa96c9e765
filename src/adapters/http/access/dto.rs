//! Request and response bodies for the access endpoints.

use serde::{Deserialize, Serialize};

use crate::application::access::{
    ConvertTrialResult, CreateTenantWithTrialResult, ResolvedDefinition, SweepReport,
};
use crate::domain::access::{ConfigSource, TrialPeriodDefinition, TrialProvenance};
use crate::domain::foundation::{EpochMillis, SubscriptionId, TenantId};

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Trial config scope; the global scope when absent.
    #[serde(default)]
    pub scope_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendTrialRequest {
    pub additional_days: u32,
    #[serde(default)]
    pub additional_minutes: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertTrialRequest {
    pub plan_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReapplyRequest {
    #[serde(default)]
    pub scope_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantResponse {
    pub tenant_id: TenantId,
    pub trial_start_date: EpochMillis,
    pub trial_end_date: EpochMillis,
    pub trial_info: TrialProvenance,
}

impl From<CreateTenantWithTrialResult> for CreateTenantResponse {
    fn from(result: CreateTenantWithTrialResult) -> Self {
        Self {
            tenant_id: result.tenant_id,
            trial_start_date: result.trial_start_date,
            trial_end_date: result.trial_end_date,
            trial_info: result.provenance,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendTrialResponse {
    pub trial_end_date: EpochMillis,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertTrialResponse {
    pub subscription_id: Option<SubscriptionId>,
    pub end_date: Option<EpochMillis>,
}

impl From<ConvertTrialResult> for ConvertTrialResponse {
    fn from(result: ConvertTrialResult) -> Self {
        Self {
            subscription_id: result.subscription_id,
            end_date: result.end_date,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveDefinitionResponse {
    pub definition: TrialPeriodDefinition,
    pub source: ConfigSource,
    pub scope_id: String,
}

impl From<ResolvedDefinition> for ActiveDefinitionResponse {
    fn from(resolved: ResolvedDefinition) -> Self {
        Self {
            definition: resolved.definition,
            source: resolved.source,
            scope_id: resolved.scope_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResponse {
    pub examined: usize,
    pub expired: usize,
    pub closing_soon: usize,
    pub final_notices: usize,
    pub failures: usize,
}

impl From<SweepReport> for SweepResponse {
    fn from(report: SweepReport) -> Self {
        Self {
            examined: report.examined,
            expired: report.expired,
            closing_soon: report.closing_soon,
            final_notices: report.final_notices,
            failures: report.failures,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReapplyResponse {
    pub updated: usize,
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response DTO
// ════════════════════════════════════════════════════════════════════════════════

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

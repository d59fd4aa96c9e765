//! HTTP handlers for the access endpoints.
//!
//! These handlers connect Axum routes to the access command/query handlers.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::access::{
    ConvertTrialCommand, ConvertTrialHandler, CreateTenantWithTrialCommand, CreateTenantWithTrialHandler,
    EnforcementGuard, ExtendTrialCommand, ExtendTrialHandler, GetTrialCountdownHandler,
    GetTrialCountdownQuery, ReapplyTrialDefinitionCommand, ReapplyTrialDefinitionHandler,
    ResolveStatusHandler, ResolveStatusQuery, ResolveTrialDefinitionHandler, ResolveTrialDefinitionQuery,
    SaveTrialConfigCommand, SaveTrialConfigHandler, SignInCheck, SweepExpiringTrialsCommand,
    SweepExpiringTrialsHandler, TrialCountdown, TrialDefaults,
};
use crate::config::{AccessConfig, ValidationError as ConfigValidationError};
use crate::domain::access::{AccessError, NoticeWindows, ResolvedStatus, TenantDraft, TrialPeriodsConfig};
use crate::domain::foundation::{ErrorCode, PlanId, ScopeId, TenantId, ValidationError};
use crate::ports::{
    Clock, EventPublisher, PlanReader, SubscriptionRepository, TenantRepository, TrialConfigStore,
    TrialNotifier,
};

use super::dto::{
    ActiveDefinitionResponse, ConvertTrialRequest, ConvertTrialResponse, CreateTenantRequest,
    CreateTenantResponse, ErrorResponse, ExtendTrialRequest, ExtendTrialResponse, ReapplyRequest,
    ReapplyResponse, SweepResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Engine tunables the handlers need.
#[derive(Debug, Clone)]
pub struct AccessSettings {
    pub global_scope: ScopeId,
    pub defaults: TrialDefaults,
    pub windows: NoticeWindows,
}

impl AccessSettings {
    pub fn from_config(config: &AccessConfig) -> Result<Self, ConfigValidationError> {
        Ok(Self {
            global_scope: config.global_scope()?,
            defaults: TrialDefaults {
                days: config.default_trial_days,
                minutes: config.default_trial_minutes,
            },
            windows: config.notice_windows(),
        })
    }
}

/// Shared state; handlers are built on demand from the ports.
#[derive(Clone)]
pub struct AccessAppState {
    pub tenants: Arc<dyn TenantRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub plans: Arc<dyn PlanReader>,
    pub trial_configs: Arc<dyn TrialConfigStore>,
    pub notifier: Arc<dyn TrialNotifier>,
    pub event_publisher: Arc<dyn EventPublisher>,
    pub clock: Arc<dyn Clock>,
    pub guard: Arc<EnforcementGuard>,
    pub settings: AccessSettings,
}

impl AccessAppState {
    pub fn resolve_status_handler(&self) -> ResolveStatusHandler {
        ResolveStatusHandler::new(self.tenants.clone(), self.subscriptions.clone(), self.clock.clone())
    }

    pub fn definitions_handler(&self) -> Arc<ResolveTrialDefinitionHandler> {
        Arc::new(
            ResolveTrialDefinitionHandler::new(self.trial_configs.clone(), self.settings.global_scope.clone())
                .with_defaults(self.settings.defaults),
        )
    }

    pub fn create_tenant_handler(&self) -> CreateTenantWithTrialHandler {
        CreateTenantWithTrialHandler::new(
            self.tenants.clone(),
            self.definitions_handler(),
            self.event_publisher.clone(),
            self.clock.clone(),
        )
    }

    pub fn extend_trial_handler(&self) -> ExtendTrialHandler {
        ExtendTrialHandler::new(self.tenants.clone(), self.event_publisher.clone(), self.clock.clone())
    }

    pub fn convert_trial_handler(&self) -> ConvertTrialHandler {
        ConvertTrialHandler::new(
            self.tenants.clone(),
            self.subscriptions.clone(),
            self.plans.clone(),
            self.event_publisher.clone(),
            self.clock.clone(),
        )
    }

    pub fn countdown_handler(&self) -> GetTrialCountdownHandler {
        GetTrialCountdownHandler::new(self.tenants.clone(), self.clock.clone())
    }

    pub fn save_config_handler(&self) -> SaveTrialConfigHandler {
        SaveTrialConfigHandler::new(self.trial_configs.clone())
    }

    pub fn reapply_handler(&self) -> ReapplyTrialDefinitionHandler {
        ReapplyTrialDefinitionHandler::new(self.tenants.clone(), self.definitions_handler(), self.clock.clone())
    }

    pub fn sweep_handler(&self) -> SweepExpiringTrialsHandler {
        SweepExpiringTrialsHandler::new(
            self.tenants.clone(),
            self.notifier.clone(),
            self.event_publisher.clone(),
            self.clock.clone(),
        )
        .with_windows(self.settings.windows)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Tenant endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /tenants/:id/status
pub async fn get_status(
    State(state): State<AccessAppState>,
    Path(id): Path<String>,
) -> Result<Json<ResolvedStatus>, AccessApiError> {
    let query = ResolveStatusQuery {
        tenant_id: TenantId::new(id)?,
    };
    let status = state.resolve_status_handler().handle(query).await?;
    Ok(Json(status))
}

/// GET /tenants/:id/trial
pub async fn get_trial_countdown(
    State(state): State<AccessAppState>,
    Path(id): Path<String>,
) -> Result<Json<TrialCountdown>, AccessApiError> {
    let tenant_id = TenantId::new(id)?;
    let countdown = state
        .countdown_handler()
        .handle(GetTrialCountdownQuery {
            tenant_id: tenant_id.clone(),
        })
        .await?
        .ok_or_else(|| AccessApiError::not_found("NOT_IN_TRIAL", format!("Tenant {} has no running trial", tenant_id)))?;
    Ok(Json(countdown))
}

/// POST /tenants
pub async fn create_tenant(
    State(state): State<AccessAppState>,
    Json(request): Json<CreateTenantRequest>,
) -> Result<impl IntoResponse, AccessApiError> {
    let scope_id = match request.scope_id {
        Some(raw) => ScopeId::new(raw)?,
        None => state.settings.global_scope.clone(),
    };
    let draft = TenantDraft {
        id: request.id.map(TenantId::new).transpose()?,
        business_name: request.business_name,
        email: request.email,
    };

    let result = state
        .create_tenant_handler()
        .handle(CreateTenantWithTrialCommand { draft, scope_id })
        .await?;

    Ok((StatusCode::CREATED, Json(CreateTenantResponse::from(result))))
}

/// POST /tenants/:id/trial/extend
pub async fn extend_trial(
    State(state): State<AccessAppState>,
    Path(id): Path<String>,
    Json(request): Json<ExtendTrialRequest>,
) -> Result<Json<ExtendTrialResponse>, AccessApiError> {
    let tenant_id = TenantId::new(id)?;
    let result = state
        .extend_trial_handler()
        .handle(ExtendTrialCommand {
            tenant_id: tenant_id.clone(),
            additional_days: request.additional_days,
            additional_minutes: request.additional_minutes,
        })
        .await?;

    match (result.extended, result.trial_end_date) {
        (true, Some(trial_end_date)) => Ok(Json(ExtendTrialResponse { trial_end_date })),
        _ => Err(AccessError::tenant_not_found(tenant_id).into()),
    }
}

/// POST /tenants/:id/convert
pub async fn convert_trial(
    State(state): State<AccessAppState>,
    Path(id): Path<String>,
    Json(request): Json<ConvertTrialRequest>,
) -> Result<Json<ConvertTrialResponse>, AccessApiError> {
    let cmd = ConvertTrialCommand {
        tenant_id: TenantId::new(id)?,
        plan_id: PlanId::new(request.plan_id)?,
    };
    let (tenant_id, plan_id) = (cmd.tenant_id.clone(), cmd.plan_id.clone());

    let result = state.convert_trial_handler().handle(cmd).await?;
    if !result.converted {
        return Err(AccessApiError::not_found(
            "CONVERSION_TARGET_NOT_FOUND",
            format!("Tenant {} or plan {} not found", tenant_id, plan_id),
        ));
    }
    Ok(Json(ConvertTrialResponse::from(result)))
}

/// POST /tenants/:id/sign-in
///
/// Always 200; the body says whether sign-in may proceed.
pub async fn sign_in_check(
    State(state): State<AccessAppState>,
    Path(id): Path<String>,
) -> Result<Json<SignInCheck>, AccessApiError> {
    let tenant_id = TenantId::new(id)?;
    Ok(Json(state.guard.check_sign_in(&tenant_id).await))
}

// ════════════════════════════════════════════════════════════════════════════════
// Trial config endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /trial-configs/:scope/active
pub async fn get_active_definition(
    State(state): State<AccessAppState>,
    Path(scope): Path<String>,
) -> Result<Json<ActiveDefinitionResponse>, AccessApiError> {
    let scope_id = ScopeId::new(scope)?;
    let resolved = state
        .definitions_handler()
        .handle(ResolveTrialDefinitionQuery {
            scope_id: scope_id.clone(),
        })
        .await?
        .ok_or_else(|| {
            AccessApiError::not_found(
                "TRIAL_CONFIG_NOT_FOUND",
                format!("No active trial definition for scope {}", scope_id),
            )
        })?;
    Ok(Json(ActiveDefinitionResponse::from(resolved)))
}

/// PUT /trial-configs/:scope
pub async fn save_trial_config(
    State(state): State<AccessAppState>,
    Path(scope): Path<String>,
    Json(config): Json<TrialPeriodsConfig>,
) -> Result<StatusCode, AccessApiError> {
    let cmd = SaveTrialConfigCommand {
        scope_id: ScopeId::new(scope)?,
        config,
    };
    state.save_config_handler().handle(cmd).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /admin/trials/sweep
pub async fn run_sweep(State(state): State<AccessAppState>) -> Result<Json<SweepResponse>, AccessApiError> {
    let report = state.sweep_handler().handle(SweepExpiringTrialsCommand).await?;
    Ok(Json(SweepResponse::from(report)))
}

/// POST /admin/trials/reapply
pub async fn reapply_definition(
    State(state): State<AccessAppState>,
    request: Option<Json<ReapplyRequest>>,
) -> Result<Json<ReapplyResponse>, AccessApiError> {
    let scope_id = match request.and_then(|Json(r)| r.scope_id) {
        Some(raw) => ScopeId::new(raw)?,
        None => state.settings.global_scope.clone(),
    };
    let updated = state
        .reapply_handler()
        .handle(ReapplyTrialDefinitionCommand { scope_id })
        .await?;
    Ok(Json(ReapplyResponse { updated }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error wrapper that converts to HTTP responses.
#[derive(Debug)]
pub enum AccessApiError {
    Access(AccessError),
    /// A lifecycle call reported `false` / `None`.
    NotFound { code: &'static str, message: String },
}

impl AccessApiError {
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        AccessApiError::NotFound {
            code,
            message: message.into(),
        }
    }
}

impl From<AccessError> for AccessApiError {
    fn from(err: AccessError) -> Self {
        AccessApiError::Access(err)
    }
}

impl From<ValidationError> for AccessApiError {
    fn from(err: ValidationError) -> Self {
        AccessApiError::Access(err.into())
    }
}

impl IntoResponse for AccessApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AccessApiError::NotFound { code, message } => {
                (StatusCode::NOT_FOUND, ErrorResponse::new(code, message))
            }
            AccessApiError::Access(err) => {
                let status = match &err {
                    AccessError::TenantNotFound(_) | AccessError::PlanNotFound(_) => StatusCode::NOT_FOUND,
                    AccessError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
                    AccessError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    AccessError::Infrastructure { code, .. } if *code == ErrorCode::IdentityProviderError => {
                        StatusCode::BAD_GATEWAY
                    }
                    AccessError::Infrastructure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!(code = %err.code(), error = %err, "request failed");
                }
                (status, ErrorResponse::new(err.code().to_string(), err.message()))
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_maps_not_found_to_404() {
        let err = AccessApiError::from(AccessError::tenant_not_found(TenantId::new("biz-1").unwrap()));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn api_error_maps_validation_to_400() {
        let err = AccessApiError::from(ValidationError::empty_field("tenant_id"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_maps_unavailable_to_503() {
        let err = AccessApiError::from(AccessError::unavailable("redis down"));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn api_error_maps_infrastructure_to_500() {
        let err = AccessApiError::from(AccessError::infrastructure("disk on fire"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn lifecycle_not_found_is_404() {
        let err = AccessApiError::not_found("NOT_IN_TRIAL", "nope");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn settings_follow_config() {
        let settings = AccessSettings::from_config(&AccessConfig {
            global_scope_id: "platform".to_string(),
            default_trial_days: 14,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(settings.global_scope.as_str(), "platform");
        assert_eq!(settings.defaults.days, 14);
    }
}

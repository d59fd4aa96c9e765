//! Access handlers - Status resolution, trial lifecycle and enforcement.
//!
//! Queries:
//! - [`ResolveStatusHandler`] - authoritative status (with the trial-flag heal)
//! - [`ResolveTrialDefinitionHandler`] - active trial definition for a scope
//! - [`GetTrialCountdownHandler`] - remaining trial time for banners
//!
//! Commands:
//! - [`CreateTenantWithTrialHandler`], [`ExtendTrialHandler`],
//!   [`ConvertTrialHandler`], [`SweepExpiringTrialsHandler`],
//!   [`ReapplyTrialDefinitionHandler`], [`SaveTrialConfigHandler`]
//!
//! Background:
//! - [`EnforcementGuard`] - sign-in and periodic checkpoints
//! - [`TrialSweepScheduler`] - runs the sweep on an interval

mod convert_trial;
mod create_tenant_with_trial;
mod enforcement_guard;
mod extend_trial;
mod get_trial_countdown;
mod reapply_trial_definition;
mod resolve_status;
mod resolve_trial_definition;
mod save_trial_config;
mod sweep_expiring_trials;
mod sweep_scheduler;

pub use convert_trial::{ConvertTrialCommand, ConvertTrialHandler, ConvertTrialResult};
pub use create_tenant_with_trial::{
    CreateTenantWithTrialCommand, CreateTenantWithTrialHandler, CreateTenantWithTrialResult,
};
pub use enforcement_guard::{Checkpoint, EnforcementGuard, GuardDecision, SignInCheck};
pub use extend_trial::{ExtendTrialCommand, ExtendTrialHandler, ExtendTrialResult};
pub use get_trial_countdown::{
    GetTrialCountdownHandler, GetTrialCountdownQuery, GetTrialCountdownResult, TrialCountdown,
};
pub use reapply_trial_definition::{
    ReapplyTrialDefinitionCommand, ReapplyTrialDefinitionHandler, ReapplyTrialDefinitionResult,
};
pub use resolve_status::{ResolveStatusHandler, ResolveStatusQuery};
pub use resolve_trial_definition::{
    ResolveTrialDefinitionHandler, ResolveTrialDefinitionQuery, ResolvedDefinition, TrialDefaults,
    TrialDuration,
};
pub use save_trial_config::{SaveTrialConfigCommand, SaveTrialConfigHandler};
pub use sweep_expiring_trials::{SweepExpiringTrialsCommand, SweepExpiringTrialsHandler, SweepReport};
pub use sweep_scheduler::TrialSweepScheduler;

use crate::domain::foundation::EventEnvelope;
use crate::ports::EventPublisher;

/// Publishes an audit event. The state change already happened, so a
/// failure is logged and swallowed.
pub(crate) async fn publish_audit(publisher: &dyn EventPublisher, envelope: EventEnvelope) {
    let event_type = envelope.event_type.clone();
    let aggregate_id = envelope.aggregate_id.clone();
    if let Err(e) = publisher.publish(envelope).await {
        tracing::warn!(
            event_type = %event_type,
            aggregate_id = %aggregate_id,
            error = %e,
            "failed to publish audit event"
        );
    }
}

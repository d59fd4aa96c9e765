//! Access module - Tenant access-status resolution.
//!
//! Decides, for one tenant at one instant, whether the application may be
//! used and why. Pure types and rules only; every I/O seam lives in `ports`.
//!
//! # Module Structure
//!
//! - `tenant` - Tenant entity and merge patches
//! - `subscription` - Subscription records and their status labels
//! - `plan` - Plans and billing-cycle period arithmetic
//! - `trial_config` - Trial period definitions, per-scope config, provenance
//! - `trial_clock` - End-instant and remaining-time arithmetic
//! - `status` - `ResolvedStatus`, `StatusCode`, `DenialReason`
//! - `rules` - The ordered status pipeline
//! - `notice` - Sweep notice windows
//! - `events` - Audit events for lifecycle operations
//! - `errors` - Access-specific errors

mod errors;
mod events;
mod notice;
mod plan;
mod rules;
mod status;
mod subscription;
mod tenant;
mod trial_clock;
mod trial_config;

pub use errors::AccessError;
pub use events::{TrialConverted, TrialExpired, TrialExtended, TrialStarted};
pub use notice::{NoticeWindows, TrialNotice, TrialNoticeKind};
pub use plan::{BillingCycle, SubscriptionPlan, FALLBACK_PERIOD_DAYS};
pub use rules::{evaluate, AccessSnapshot, Resolution, StatusRule, OPEN_TRIAL_DAYS_REMAINING, STATUS_PIPELINE};
pub use status::{DenialReason, ResolvedStatus, StatusCode};
pub use subscription::{SubscriptionRecord, SubscriptionStatus};
pub use tenant::{Tenant, TenantDraft, TenantPatch, STATUS_ACTIVE, STATUS_INACTIVE};
pub use trial_clock::{compute_end_instant, days_remaining_ceil, remaining, TrialRemaining};
pub use trial_config::{
    ConfigSource, TrialPeriodDefinition, TrialPeriodsConfig, TrialProvenance, DEFAULT_ACTIVE_TRIAL_ID,
    DEFAULT_TRIAL_DAYS, DEFAULT_TRIAL_MINUTES, MAX_TRIAL_DAYS, MAX_TRIAL_MINUTES,
};

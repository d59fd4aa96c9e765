//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod access;

pub use access::{
    // Queries
    GetTrialCountdownHandler, GetTrialCountdownQuery, GetTrialCountdownResult, ResolveStatusHandler,
    ResolveStatusQuery, ResolveTrialDefinitionHandler, ResolveTrialDefinitionQuery, ResolvedDefinition,
    TrialCountdown, TrialDefaults, TrialDuration,
    // Commands
    ConvertTrialCommand, ConvertTrialHandler, ConvertTrialResult, CreateTenantWithTrialCommand,
    CreateTenantWithTrialHandler, CreateTenantWithTrialResult, ExtendTrialCommand, ExtendTrialHandler,
    ExtendTrialResult, ReapplyTrialDefinitionCommand, ReapplyTrialDefinitionHandler,
    ReapplyTrialDefinitionResult, SaveTrialConfigCommand, SaveTrialConfigHandler,
    SweepExpiringTrialsCommand, SweepExpiringTrialsHandler, SweepReport,
    // Background
    Checkpoint, EnforcementGuard, GuardDecision, SignInCheck, TrialSweepScheduler,
};

//! EnforcementGuard - Access checkpoints for live sessions.
//!
//! At sign-in and on a recurring poll the guard resolves the session's
//! tenant. Disqualifying statuses (`subscription_expired`,
//! `subscription_cancelled`, `trial_expired`) are enforced:
//!
//! 1. A [`DenialReason`] is built from the resolved status.
//! 2. It is written to the handoff store under `subscription_error`.
//! 3. The identity session is terminated.
//! 4. The caller is pointed at the landing route.
//!
//! `no_subscription` is refused at sign-in but tolerated by the poll, so a
//! tenant whose first subscription is still being written is not thrown out
//! mid-session. A resolution failure fails closed with the generic
//! "could not verify" reason.
//!
//! If the identity provider refuses to end the session the decision is
//! [`GuardDecision::TerminationFailed`]; the session is still live, and the
//! next checkpoint tries again.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::time;

use crate::domain::access::{DenialReason, ResolvedStatus, StatusCode};
use crate::domain::foundation::TenantId;
use crate::ports::{HandoffStore, IdentityProvider, IdentitySession, SessionChange};

use super::{ResolveStatusHandler, ResolveStatusQuery};

pub const DEFAULT_LANDING_ROUTE: &str = "/#/subscription-plans";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(600);

/// Where the check is happening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    SignIn,
    Periodic,
}

/// Outcome of a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Access continues. `trial_days_remaining` is set only for
    /// `trial_active`, for the informational banner.
    Proceed {
        status: ResolvedStatus,
        trial_days_remaining: Option<i64>,
    },
    /// The session was terminated.
    Enforced {
        reason: DenialReason,
        redirect_to: String,
    },
    /// Access is denied but the session could not be terminated.
    TerminationFailed { reason: DenialReason },
}

impl GuardDecision {
    /// The session was actually ended.
    pub fn is_enforced(&self) -> bool {
        matches!(self, GuardDecision::Enforced { .. })
    }

    pub fn denies_access(&self) -> bool {
        !matches!(self, GuardDecision::Proceed { .. })
    }
}

/// Answer of the sign-in gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInCheck {
    pub allowed: bool,
    pub message: String,
    pub status_code: StatusCode,
}

pub struct EnforcementGuard {
    resolver: Arc<ResolveStatusHandler>,
    identity: Arc<dyn IdentityProvider>,
    handoff: Arc<dyn HandoffStore>,
    landing_route: String,
    poll_interval: Duration,
}

impl EnforcementGuard {
    pub fn new(
        resolver: Arc<ResolveStatusHandler>,
        identity: Arc<dyn IdentityProvider>,
        handoff: Arc<dyn HandoffStore>,
    ) -> Self {
        Self {
            resolver,
            identity,
            handoff,
            landing_route: DEFAULT_LANDING_ROUTE.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_landing_route(mut self, route: impl Into<String>) -> Self {
        self.landing_route = route.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn landing_route(&self) -> &str {
        &self.landing_route
    }

    /// Runs one checkpoint for `session`. Never fails.
    pub async fn check(&self, session: &IdentitySession, checkpoint: Checkpoint) -> GuardDecision {
        let status = match self
            .resolver
            .handle(ResolveStatusQuery {
                tenant_id: session.tenant_id.clone(),
            })
            .await
        {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(
                    tenant_id = %session.tenant_id,
                    session_id = %session.session_id,
                    error = %e,
                    "status resolution failed, denying access"
                );
                return self.enforce(session, DenialReason::unverifiable()).await;
            }
        };

        let code = status.status_code;
        if code.grants_access() {
            let trial_days_remaining = if code == StatusCode::TrialActive {
                status.trial_days_remaining
            } else {
                None
            };
            return GuardDecision::Proceed {
                status,
                trial_days_remaining,
            };
        }

        if !code.is_disqualifying() && checkpoint == Checkpoint::Periodic {
            tracing::debug!(tenant_id = %session.tenant_id, status = %code, "tolerated during session");
            return GuardDecision::Proceed {
                status,
                trial_days_remaining: None,
            };
        }

        let reason = DenialReason::for_status(&status).unwrap_or_else(DenialReason::unverifiable);
        self.enforce(session, reason).await
    }

    /// Checks whatever session is current. `None` when nobody is signed in
    /// or the provider could not be asked.
    pub async fn check_current(&self, checkpoint: Checkpoint) -> Option<GuardDecision> {
        match self.identity.current_session().await {
            Ok(Some(session)) => Some(self.check(&session, checkpoint).await),
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "could not read current session");
                None
            }
        }
    }

    /// Sign-in gate without side effects on the session.
    pub async fn check_sign_in(&self, tenant_id: &TenantId) -> SignInCheck {
        match self
            .resolver
            .handle(ResolveStatusQuery {
                tenant_id: tenant_id.clone(),
            })
            .await
        {
            Ok(status) => SignInCheck {
                allowed: status.status_code.grants_access(),
                message: status.message,
                status_code: status.status_code,
            },
            Err(e) => {
                tracing::error!(tenant_id = %tenant_id, error = %e, "sign-in check failed, denying");
                let reason = DenialReason::unverifiable();
                SignInCheck {
                    allowed: false,
                    message: reason.message,
                    status_code: reason.status_code,
                }
            }
        }
    }

    /// Watches session changes and polls the current session until
    /// `shutdown` flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut changes = self.identity.subscribe();
        let mut interval = time::interval(self.poll_interval);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("enforcement guard stopped");
                        return;
                    }
                }

                change = changes.recv() => match change {
                    Ok(SessionChange::SignedIn(session)) => {
                        self.check(&session, Checkpoint::SignIn).await;
                    }
                    Ok(SessionChange::SignedOut(session_id)) => {
                        tracing::debug!(session_id = %session_id, "session signed out");
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session changes lagged, rechecking current session");
                        self.check_current(Checkpoint::SignIn).await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("identity provider closed session stream");
                        return;
                    }
                },

                _ = interval.tick() => {
                    self.check_current(Checkpoint::Periodic).await;
                }
            }
        }
    }

    async fn enforce(&self, session: &IdentitySession, reason: DenialReason) -> GuardDecision {
        if let Err(e) = self.handoff.put(&session.session_id, &reason).await {
            tracing::warn!(session_id = %session.session_id, error = %e, "failed to store denial reason");
        }

        if let Err(e) = self.identity.terminate(&session.session_id).await {
            tracing::error!(
                tenant_id = %session.tenant_id,
                session_id = %session.session_id,
                status = %reason.status_code,
                error = %e,
                "failed to terminate denied session, retrying at next checkpoint"
            );
            return GuardDecision::TerminationFailed { reason };
        }

        tracing::warn!(
            tenant_id = %session.tenant_id,
            session_id = %session.session_id,
            status = %reason.status_code,
            redirect_to = %self.landing_route,
            "access enforced, session terminated"
        );

        GuardDecision::Enforced {
            reason,
            redirect_to: self.landing_route.clone(),
        }
    }
}

//! Resolved access status and the denial reason derived from it.
//!
//! `ResolvedStatus` is transient: it is computed per call and never stored.
//! Each constructor sets every flag so the record is coherent with its
//! status code.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::EpochMillis;

/// The single authoritative answer for one tenant at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    ActiveSubscription,
    TrialActive,
    TrialExpired,
    SubscriptionExpired,
    SubscriptionCancelled,
    NoSubscription,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::ActiveSubscription => "active_subscription",
            StatusCode::TrialActive => "trial_active",
            StatusCode::TrialExpired => "trial_expired",
            StatusCode::SubscriptionExpired => "subscription_expired",
            StatusCode::SubscriptionCancelled => "subscription_cancelled",
            StatusCode::NoSubscription => "no_subscription",
        }
    }

    /// Paid or trial access.
    pub fn grants_access(&self) -> bool {
        matches!(self, StatusCode::ActiveSubscription | StatusCode::TrialActive)
    }

    /// Statuses that end a live session.
    pub fn is_disqualifying(&self) -> bool {
        matches!(
            self,
            StatusCode::SubscriptionExpired
                | StatusCode::SubscriptionCancelled
                | StatusCode::TrialExpired
        )
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStatus {
    pub has_active_subscription: bool,
    pub is_in_trial: bool,
    /// Present only for `trial_active`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_days_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_end_date: Option<EpochMillis>,
    pub subscription_expired: bool,
    pub trial_expired: bool,
    pub subscription_cancelled: bool,
    pub message: String,
    pub status_code: StatusCode,
}

impl ResolvedStatus {
    fn base(status_code: StatusCode, message: String) -> Self {
        Self {
            has_active_subscription: false,
            is_in_trial: false,
            trial_days_remaining: None,
            subscription_end_date: None,
            subscription_expired: false,
            trial_expired: false,
            subscription_cancelled: false,
            message,
            status_code,
        }
    }

    pub fn trial_active(days_remaining: i64) -> Self {
        Self {
            is_in_trial: true,
            trial_days_remaining: Some(days_remaining),
            ..Self::base(
                StatusCode::TrialActive,
                format!(
                    "You are in your trial period. {} day(s) remaining.",
                    days_remaining
                ),
            )
        }
    }

    pub fn active_subscription(end_date: EpochMillis) -> Self {
        Self {
            has_active_subscription: true,
            subscription_end_date: Some(end_date),
            ..Self::base(
                StatusCode::ActiveSubscription,
                format!(
                    "You have an active subscription until {}.",
                    end_date.format_date()
                ),
            )
        }
    }

    pub fn subscription_expired(end_date: EpochMillis) -> Self {
        Self {
            subscription_expired: true,
            subscription_end_date: Some(end_date),
            ..Self::base(
                StatusCode::SubscriptionExpired,
                format!(
                    "Your subscription expired on {}. Please renew it to keep using the application.",
                    end_date.format_date()
                ),
            )
        }
    }

    pub fn trial_expired(trial_end: Option<EpochMillis>) -> Self {
        let message = match trial_end {
            Some(end) => format!("Your trial period ended on {}.", end.format_date()),
            None => "Your trial period has ended.".to_string(),
        };
        Self {
            trial_expired: true,
            ..Self::base(StatusCode::TrialExpired, message)
        }
    }

    pub fn subscription_cancelled(cancelled_on: EpochMillis) -> Self {
        Self {
            subscription_cancelled: true,
            subscription_end_date: Some(cancelled_on),
            ..Self::base(
                StatusCode::SubscriptionCancelled,
                format!(
                    "Your subscription was cancelled on {}. Please contact support for more information.",
                    cancelled_on.format_date()
                ),
            )
        }
    }

    pub fn no_subscription() -> Self {
        Self::base(
            StatusCode::NoSubscription,
            "You do not have an active subscription. Please choose a plan to access the application."
                .to_string(),
        )
    }

    pub fn grants_access(&self) -> bool {
        self.status_code.grants_access()
    }
}

/// Reason handed across the sign-out redirect under the `subscription_error`
/// key. Read once by the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DenialReason {
    pub title: String,
    pub message: String,
    pub status_code: StatusCode,
}

impl DenialReason {
    /// Builds the reason for a status that refuses access, `None` otherwise.
    pub fn for_status(status: &ResolvedStatus) -> Option<Self> {
        let (title, fallback) = match status.status_code {
            StatusCode::SubscriptionExpired => (
                "Subscription expired",
                "Your subscription has expired. Please renew it to keep using the application.",
            ),
            StatusCode::SubscriptionCancelled => (
                "Subscription cancelled",
                "Your subscription was cancelled. Please subscribe again to keep using the application.",
            ),
            StatusCode::TrialExpired => (
                "Trial period ended",
                "Your trial period has ended. Please choose a plan to keep using the application.",
            ),
            StatusCode::NoSubscription => (
                "No active subscription",
                "You do not have an active subscription.",
            ),
            StatusCode::ActiveSubscription | StatusCode::TrialActive => return None,
        };
        let message = if status.message.is_empty() {
            fallback.to_string()
        } else {
            status.message.clone()
        };
        Some(Self {
            title: title.to_string(),
            message,
            status_code: status.status_code,
        })
    }

    /// Generic denial used only when resolution itself failed.
    pub fn unverifiable() -> Self {
        Self {
            title: "Access could not be verified".to_string(),
            message: "We could not verify your subscription status. Please try again later."
                .to_string(),
            status_code: StatusCode::NoSubscription,
        }
    }
}

//! Subscription records as seen by the resolver.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{EpochMillis, PlanId, SubscriptionId, TenantId};

use super::BillingCycle;

/// Stored status of a subscription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Pending,
    Cancelled,
    Expired,
    /// No stored label, or one this engine does not know.
    Unlabelled,
}

impl SubscriptionStatus {
    /// Parses a stored label. Accepts the American spelling of cancelled.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "pending" => Some(Self::Pending),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    /// Like [`parse`](Self::parse), but a missing or unknown label becomes
    /// [`Unlabelled`](Self::Unlabelled) so the record still counts as
    /// non-active.
    pub fn from_label(label: Option<&str>) -> Self {
        label.and_then(Self::parse).unwrap_or(Self::Unlabelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Unlabelled => "unlabelled",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One paid (or attempted) subscription period for a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub id: SubscriptionId,

    /// Stored as `clientId` for compatibility with existing documents.
    #[serde(rename = "clientId")]
    pub tenant_id: TenantId,

    pub plan_id: PlanId,

    pub start_date: EpochMillis,

    pub end_date: EpochMillis,

    pub status: SubscriptionStatus,

    pub auto_renew: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_date: Option<EpochMillis>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_cycle: Option<BillingCycle>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SubscriptionRecord {
    /// Status is active and the period has not ended.
    pub fn is_live_at(&self, now: EpochMillis) -> bool {
        self.status == SubscriptionStatus::Active && self.end_date.is_after(now)
    }

    /// Explicitly expired, or a non-active record whose end date has passed.
    pub fn is_expired_at(&self, now: EpochMillis) -> bool {
        match self.status {
            SubscriptionStatus::Expired => true,
            SubscriptionStatus::Active => false,
            _ => !self.end_date.is_after(now),
        }
    }

    /// Date reported for a cancellation: the cancel date, else the period end.
    pub fn cancellation_date(&self) -> EpochMillis {
        self.cancel_date.unwrap_or(self.end_date)
    }
}

//! Strongly-typed identifier value objects.
//!
//! Record-store documents are keyed by opaque strings, so every identifier
//! wraps a non-empty `String`. Freshly created records get a UUID v4.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates the identifier, returning error if empty.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::empty_field($field));
                }
                Ok(Self(id))
            }

            /// Creates a new random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Returns the inner string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a business tenant.
    TenantId,
    "tenant_id"
);

string_id!(
    /// Identifier of a subscription record.
    SubscriptionId,
    "subscription_id"
);

string_id!(
    /// Identifier of a subscription plan.
    PlanId,
    "plan_id"
);

string_id!(
    /// Configuration scope: a tenant's own id or the global fallback scope.
    ScopeId,
    "scope_id"
);

string_id!(
    /// Identity session handle issued by the external identity provider.
    SessionId,
    "session_id"
);

impl From<&TenantId> for ScopeId {
    fn from(id: &TenantId) -> Self {
        Self(id.as_str().to_string())
    }
}

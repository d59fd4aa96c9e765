//! Access-engine error types.
//!
//! Expected absences (unknown tenant or plan) are not errors for lifecycle
//! operations; those return `false` or `None`. `AccessError` covers input
//! that cannot be acted on and I/O failures that must reach the caller.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | TenantNotFound | 404 |
//! | PlanNotFound | 404 |
//! | ValidationFailed | 400 |
//! | Infrastructure | 500 |
//! | Unavailable | 503 |

use crate::domain::foundation::{DomainError, ErrorCode, PlanId, TenantId, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    TenantNotFound(TenantId),

    PlanNotFound(PlanId),

    ValidationFailed {
        field: String,
        message: String,
    },

    /// Store or provider call failed.
    Infrastructure {
        code: ErrorCode,
        message: String,
    },

    /// A backing service could not be reached at all.
    Unavailable(String),
}

impl AccessError {
    pub fn tenant_not_found(id: TenantId) -> Self {
        AccessError::TenantNotFound(id)
    }

    pub fn plan_not_found(id: PlanId) -> Self {
        AccessError::PlanNotFound(id)
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AccessError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        AccessError::Infrastructure {
            code: ErrorCode::InternalError,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        AccessError::Unavailable(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            AccessError::TenantNotFound(_) => ErrorCode::TenantNotFound,
            AccessError::PlanNotFound(_) => ErrorCode::PlanNotFound,
            AccessError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            AccessError::Infrastructure { code, .. } => *code,
            AccessError::Unavailable(_) => ErrorCode::CacheError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            AccessError::TenantNotFound(id) => format!("Tenant not found: {}", id),
            AccessError::PlanNotFound(id) => format!("Plan not found: {}", id),
            AccessError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            AccessError::Infrastructure { message, .. } => format!("Error: {}", message),
            AccessError::Unavailable(message) => format!("Service unavailable: {}", message),
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AccessError::Infrastructure { .. } | AccessError::Unavailable(_)
        )
    }
}

impl std::fmt::Display for AccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AccessError {}

impl From<DomainError> for AccessError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => AccessError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::CacheError | ErrorCode::IdentityProviderError
                if err.details.get("connect").is_some() =>
            {
                AccessError::Unavailable(err.message)
            }
            code => AccessError::Infrastructure {
                code,
                message: err.message,
            },
        }
    }
}

impl From<ValidationError> for AccessError {
    fn from(err: ValidationError) -> Self {
        AccessError::validation(err.field().to_string(), err.to_string())
    }
}

impl From<AccessError> for DomainError {
    fn from(err: AccessError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_errors_map_to_codes() {
        let err = AccessError::tenant_not_found(TenantId::new("biz-1").unwrap());
        assert_eq!(err.code(), ErrorCode::TenantNotFound);
        assert_eq!(err.message(), "Tenant not found: biz-1");
        assert!(!err.is_retryable());
    }

    #[test]
    fn database_failure_is_retryable_infrastructure() {
        let err: AccessError = DomainError::new(ErrorCode::DatabaseError, "timeout").into();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
        assert!(err.is_retryable());
    }

    #[test]
    fn domain_validation_keeps_field() {
        let err: AccessError = DomainError::validation("days", "too long").into();
        assert_eq!(
            err,
            AccessError::ValidationFailed {
                field: "days".to_string(),
                message: "too long".to_string()
            }
        );
    }

    #[test]
    fn connect_failures_become_unavailable() {
        let err: AccessError = DomainError::new(ErrorCode::CacheError, "refused")
            .with_detail("connect", "true")
            .into();
        assert!(matches!(err, AccessError::Unavailable(_)));
    }

    #[test]
    fn round_trips_into_domain_error() {
        let err: DomainError = AccessError::plan_not_found(PlanId::new("p").unwrap()).into();
        assert_eq!(err.code, ErrorCode::PlanNotFound);
    }
}

//! Plan change error taxonomy.
//!
//! Every engine operation fails with one of these errors. The variant is the
//! category callers branch on; the embedded `ErrorCode` is the precise reason.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Validation | 400 |
//! | NotFound | 404 |
//! | Conflict | 409 |
//! | StaleData | 409 |
//! | Execution | 502 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{
    DomainError, ErrorCode, ImpactReportId, MigrationPlanId, PlanId, SubscriptionId,
    ValidationError,
};

/// Errors surfaced by the plan change engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanChangeError {
    /// Bad input: unknown plan, malformed change, blocking issues.
    Validation { field: String, message: String },

    /// A plan, plan version, report or migration plan does not exist.
    NotFound { code: ErrorCode, message: String },

    /// Optimistic-version race, second active migration, or illegal status change.
    Conflict { code: ErrorCode, message: String },

    /// A per-subscription step failed during execution.
    Execution {
        code: ErrorCode,
        subscription_id: Option<SubscriptionId>,
        reason: String,
    },

    /// Stored data no longer matches what a plan was built against.
    StaleData {
        subscription_id: Option<SubscriptionId>,
        reason: String,
    },

    /// Storage or collaborator failure.
    Infrastructure(String),
}

impl PlanChangeError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PlanChangeError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn plan_not_found(id: PlanId) -> Self {
        PlanChangeError::NotFound {
            code: ErrorCode::PlanNotFound,
            message: format!("Plan not found: {}", id),
        }
    }

    pub fn version_not_found(plan_id: PlanId, version: u32) -> Self {
        PlanChangeError::NotFound {
            code: ErrorCode::PlanVersionNotFound,
            message: format!("Plan {} has no version {}", plan_id, version),
        }
    }

    pub fn report_not_found(id: ImpactReportId) -> Self {
        PlanChangeError::NotFound {
            code: ErrorCode::ImpactReportNotFound,
            message: format!("Impact report not found: {}", id),
        }
    }

    pub fn migration_plan_not_found(id: MigrationPlanId) -> Self {
        PlanChangeError::NotFound {
            code: ErrorCode::MigrationPlanNotFound,
            message: format!("Migration plan not found: {}", id),
        }
    }

    pub fn version_conflict(plan_id: PlanId, expected: u32, actual: u32) -> Self {
        PlanChangeError::Conflict {
            code: ErrorCode::VersionConflict,
            message: format!(
                "Plan {} is at version {}, expected {}",
                plan_id, actual, expected
            ),
        }
    }

    pub fn active_migration_exists(plan_id: PlanId, existing: MigrationPlanId) -> Self {
        PlanChangeError::Conflict {
            code: ErrorCode::ActiveMigrationExists,
            message: format!(
                "Plan {} already has an active migration plan {}",
                plan_id, existing
            ),
        }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        PlanChangeError::Conflict {
            code: ErrorCode::InvalidStateTransition,
            message: format!(
                "Cannot {} a migration plan in {} state",
                attempted.into(),
                current.into()
            ),
        }
    }

    pub fn step_failed(subscription_id: SubscriptionId, reason: impl Into<String>) -> Self {
        PlanChangeError::Execution {
            code: ErrorCode::StepFailed,
            subscription_id: Some(subscription_id),
            reason: reason.into(),
        }
    }

    pub fn step_timed_out(subscription_id: SubscriptionId, timeout_ms: u64) -> Self {
        PlanChangeError::Execution {
            code: ErrorCode::StepTimedOut,
            subscription_id: Some(subscription_id),
            reason: format!("Step exceeded {}ms", timeout_ms),
        }
    }

    pub fn stale(subscription_id: Option<SubscriptionId>, reason: impl Into<String>) -> Self {
        PlanChangeError::StaleData {
            subscription_id,
            reason: reason.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        PlanChangeError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PlanChangeError::Validation { .. } => ErrorCode::ValidationFailed,
            PlanChangeError::NotFound { code, .. }
            | PlanChangeError::Conflict { code, .. }
            | PlanChangeError::Execution { code, .. } => *code,
            PlanChangeError::StaleData { .. } => ErrorCode::StaleData,
            PlanChangeError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            PlanChangeError::Validation { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            PlanChangeError::NotFound { message, .. }
            | PlanChangeError::Conflict { message, .. } => message.clone(),
            PlanChangeError::Execution {
                subscription_id,
                reason,
                ..
            } => match subscription_id {
                Some(id) => format!("Migration step for subscription {} failed: {}", id, reason),
                None => format!("Migration step failed: {}", reason),
            },
            PlanChangeError::StaleData {
                subscription_id,
                reason,
            } => match subscription_id {
                Some(id) => format!("Subscription {} is stale: {}", id, reason),
                None => format!("Stale data: {}", reason),
            },
            PlanChangeError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if the executor may retry the operation.
    ///
    /// Only per-step execution failures qualify; everything else is
    /// surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlanChangeError::Execution { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, PlanChangeError::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PlanChangeError::NotFound { .. })
    }
}

impl std::fmt::Display for PlanChangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PlanChangeError {}

impl From<DomainError> for PlanChangeError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => PlanChangeError::Validation {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::PlanNotFound
            | ErrorCode::PlanVersionNotFound
            | ErrorCode::SubscriptionNotFound
            | ErrorCode::ImpactReportNotFound
            | ErrorCode::MigrationPlanNotFound => PlanChangeError::NotFound {
                code: err.code,
                message: err.message,
            },
            ErrorCode::VersionConflict
            | ErrorCode::ActiveMigrationExists
            | ErrorCode::InvalidStateTransition => PlanChangeError::Conflict {
                code: err.code,
                message: err.message,
            },
            ErrorCode::StaleData => PlanChangeError::StaleData {
                subscription_id: None,
                reason: err.message,
            },
            ErrorCode::StepFailed | ErrorCode::StepTimedOut | ErrorCode::CollaboratorError => {
                PlanChangeError::Execution {
                    code: err.code,
                    subscription_id: None,
                    reason: err.message,
                }
            }
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                PlanChangeError::Infrastructure(err.message)
            }
        }
    }
}

impl From<ValidationError> for PlanChangeError {
    fn from(err: ValidationError) -> Self {
        PlanChangeError::Validation {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<PlanChangeError> for DomainError {
    fn from(err: PlanChangeError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

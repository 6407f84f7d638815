//! Data Transfer Objects for plan change endpoints.
//!
//! Request bodies are validated into domain types here; responses wrap the
//! domain entities so every mutating call returns the full entity state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ImpactReportId, PlanId, ValidationError};
use crate::domain::impact::ImpactReport;
use crate::domain::migration::{ExecutionSummary, MigrationPlan};
use crate::domain::plan::{BillingPeriod, PlanSnapshot, PlanStatus, Pricing};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to register a new plan.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanRequest {
    pub name: String,
    #[serde(default)]
    pub status: Option<PlanStatus>,
    pub amount_cents: i64,
    pub currency: String,
    pub billing_period: BillingPeriod,
    #[serde(default)]
    pub features: BTreeSet<String>,
    #[serde(default)]
    pub limits: BTreeMap<String, u64>,
}

impl CreatePlanRequest {
    /// Converts the request into the version 1 snapshot.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for a negative amount or malformed currency.
    pub fn into_snapshot(self) -> Result<PlanSnapshot, ValidationError> {
        Ok(PlanSnapshot {
            name: self.name,
            status: self.status.unwrap_or(PlanStatus::Active),
            pricing: Pricing::new(self.amount_cents, self.currency, self.billing_period)?,
            features: self.features,
            limits: self.limits,
        })
    }
}

/// Request to build a draft migration plan from an impact report.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildMigrationPlanRequest {
    pub impact_report_id: ImpactReportId,
    /// Plans affected subscriptions may be moved to.
    #[serde(default)]
    pub candidates: Vec<PlanId>,
}

/// Request to assign a flagged subscription to a target plan.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignTargetRequest {
    pub target_plan_id: PlanId,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Impact report with the revenue figure also rendered as a decimal string.
#[derive(Debug, Clone, Serialize)]
pub struct ImpactReportResponse {
    #[serde(flatten)]
    pub report: ImpactReport,
    pub revenue_at_risk_display: String,
}

impl From<ImpactReport> for ImpactReportResponse {
    fn from(report: ImpactReport) -> Self {
        Self {
            revenue_at_risk_display: report.revenue_at_risk.to_string(),
            report,
        }
    }
}

/// Migration plan state, plus the execution summary once the plan has run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationPlanResponse {
    #[serde(flatten)]
    pub migration_plan: MigrationPlan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ExecutionSummary>,
}

impl MigrationPlanResponse {
    pub fn new(migration_plan: MigrationPlan, summary: Option<ExecutionSummary>) -> Self {
        Self {
            migration_plan,
            summary,
        }
    }
}

impl From<MigrationPlan> for MigrationPlanResponse {
    fn from(plan: MigrationPlan) -> Self {
        let summary = plan.execution_summary();
        Self::new(plan, summary)
    }
}

/// Health probe body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Standard error response format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

//! HTTP handlers for plan change endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Json, Path, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use crate::application::handlers::impact::{
    AnalyzeChangeCommand, AnalyzeChangeHandler, GetImpactReportHandler, GetImpactReportQuery,
};
use crate::application::handlers::migration::{
    ApproveMigrationCommand, ApproveMigrationHandler, AssignManuallyCommand,
    AssignManuallyHandler, BuildMigrationPlanCommand, BuildMigrationPlanHandler,
    CancelMigrationCommand, CancelMigrationHandler, ExecuteMigrationCommand,
    ExecuteMigrationHandler, GetMigrationPlanHandler, GetMigrationPlanQuery,
    RollbackMigrationCommand, RollbackMigrationHandler,
};
use crate::application::handlers::plan::{
    CreatePlanCommand, CreatePlanHandler, GetPlanHandler, GetPlanQuery, ListPlanVersionsHandler,
    ListPlanVersionsQuery, RollbackPlanVersionCommand, RollbackPlanVersionHandler,
};
use crate::application::ExecutionRegistry;
use crate::domain::foundation::{ActorId, DomainError, ErrorCode, ValidationError};
use crate::domain::impact::ProposedChange;
use crate::domain::migration::ExecutionPolicy;
use crate::domain::PlanChangeError;
use crate::ports::{
    BillingService, ImpactReportRepository, MigrationPlanRepository, NotificationService,
    PlanVersionStore, SubscriptionReader, SubscriptionRepository, UsageService,
};

use super::dto::{
    AssignTargetRequest, BuildMigrationPlanRequest, CreatePlanRequest, ErrorResponse,
    HealthResponse, ImpactReportResponse, MigrationPlanResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; handlers are built on demand from the shared ports.
#[derive(Clone)]
pub struct PlanChangeAppState {
    pub plan_store: Arc<dyn PlanVersionStore>,
    pub subscription_reader: Arc<dyn SubscriptionReader>,
    pub subscription_repository: Arc<dyn SubscriptionRepository>,
    pub impact_reports: Arc<dyn ImpactReportRepository>,
    pub migration_plans: Arc<dyn MigrationPlanRepository>,
    pub usage: Arc<dyn UsageService>,
    pub billing: Arc<dyn BillingService>,
    pub notifier: Arc<dyn NotificationService>,
    pub registry: Arc<ExecutionRegistry>,
    pub policy: ExecutionPolicy,
}

impl PlanChangeAppState {
    pub fn create_plan_handler(&self) -> CreatePlanHandler {
        CreatePlanHandler::new(self.plan_store.clone())
    }

    pub fn get_plan_handler(&self) -> GetPlanHandler {
        GetPlanHandler::new(self.plan_store.clone())
    }

    pub fn list_versions_handler(&self) -> ListPlanVersionsHandler {
        ListPlanVersionsHandler::new(self.plan_store.clone())
    }

    pub fn rollback_version_handler(&self) -> RollbackPlanVersionHandler {
        RollbackPlanVersionHandler::new(self.plan_store.clone())
    }

    pub fn analyze_handler(&self) -> AnalyzeChangeHandler {
        AnalyzeChangeHandler::new(
            self.plan_store.clone(),
            self.subscription_reader.clone(),
            self.usage.clone(),
            self.impact_reports.clone(),
            self.notifier.clone(),
        )
    }

    pub fn get_report_handler(&self) -> GetImpactReportHandler {
        GetImpactReportHandler::new(self.impact_reports.clone())
    }

    pub fn build_handler(&self) -> BuildMigrationPlanHandler {
        BuildMigrationPlanHandler::new(
            self.plan_store.clone(),
            self.impact_reports.clone(),
            self.subscription_reader.clone(),
            self.usage.clone(),
            self.migration_plans.clone(),
        )
    }

    pub fn get_migration_plan_handler(&self) -> GetMigrationPlanHandler {
        GetMigrationPlanHandler::new(self.migration_plans.clone())
    }

    pub fn assign_handler(&self) -> AssignManuallyHandler {
        AssignManuallyHandler::new(self.plan_store.clone(), self.migration_plans.clone())
    }

    pub fn approve_handler(&self) -> ApproveMigrationHandler {
        ApproveMigrationHandler::new(self.migration_plans.clone())
    }

    pub fn execute_handler(&self) -> ExecuteMigrationHandler {
        ExecuteMigrationHandler::new(
            self.plan_store.clone(),
            self.migration_plans.clone(),
            self.subscription_reader.clone(),
            self.subscription_repository.clone(),
            self.billing.clone(),
            self.notifier.clone(),
            self.registry.clone(),
            self.policy,
        )
    }

    pub fn cancel_handler(&self) -> CancelMigrationHandler {
        CancelMigrationHandler::new(self.migration_plans.clone(), self.registry.clone())
    }

    pub fn rollback_handler(&self) -> RollbackMigrationHandler {
        RollbackMigrationHandler::new(
            self.plan_store.clone(),
            self.migration_plans.clone(),
            self.subscription_reader.clone(),
            self.subscription_repository.clone(),
            self.billing.clone(),
            self.notifier.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Operator Context
// ════════════════════════════════════════════════════════════════════════════════

/// Operator identity taken from the `X-Actor-Id` header.
#[derive(Debug, Clone)]
pub struct ActorHeader(pub ActorId);

pub const ACTOR_HEADER: &str = "X-Actor-Id";

/// Rejection for a missing or blank `X-Actor-Id`.
pub struct ActorRequired;

impl IntoResponse for ActorRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new(
            "ACTOR_REQUIRED",
            format!("The {} header is required", ACTOR_HEADER),
        );
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ActorHeader
where
    S: Send + Sync,
{
    type Rejection = ActorRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| ActorId::new(s).ok())
            .map(ActorHeader)
            .ok_or(ActorRequired)
    }
}

fn parse_id<T: FromStr>(raw: &str, field: &str) -> Result<T, PlanChangeError> {
    raw.parse()
        .map_err(|_| PlanChangeError::validation(field, format!("'{}' is not a valid id", raw)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Plan Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /plans - Register a plan at version 1
pub async fn create_plan(
    State(state): State<PlanChangeAppState>,
    ActorHeader(actor): ActorHeader,
    payload: Result<Json<CreatePlanRequest>, JsonRejection>,
) -> Result<impl IntoResponse, PlanChangeApiError> {
    let Json(request) = payload?;
    let snapshot = request.into_snapshot()?;

    let result = state
        .create_plan_handler()
        .handle(CreatePlanCommand { snapshot, actor })
        .await?;

    Ok((StatusCode::CREATED, Json(result.version)))
}

/// GET /plans/:id - Current plan state
pub async fn get_plan(
    State(state): State<PlanChangeAppState>,
    Path(plan_id): Path<String>,
) -> Result<impl IntoResponse, PlanChangeApiError> {
    let plan_id = parse_id(&plan_id, "plan_id")?;
    let plan = state.get_plan_handler().handle(GetPlanQuery { plan_id }).await?;
    Ok(Json(plan))
}

/// GET /plans/:id/versions - Version history, oldest first
pub async fn list_plan_versions(
    State(state): State<PlanChangeAppState>,
    Path(plan_id): Path<String>,
) -> Result<impl IntoResponse, PlanChangeApiError> {
    let plan_id = parse_id(&plan_id, "plan_id")?;
    let versions = state
        .list_versions_handler()
        .handle(ListPlanVersionsQuery { plan_id })
        .await?;
    Ok(Json(versions))
}

/// POST /plans/:id/versions/:version/rollback - Append a copy of an earlier version
pub async fn rollback_plan_version(
    State(state): State<PlanChangeAppState>,
    ActorHeader(actor): ActorHeader,
    Path((plan_id, version)): Path<(String, String)>,
) -> Result<impl IntoResponse, PlanChangeApiError> {
    let plan_id = parse_id(&plan_id, "plan_id")?;
    let to_version: u32 = parse_id(&version, "version")?;

    let result = state
        .rollback_version_handler()
        .handle(RollbackPlanVersionCommand {
            plan_id,
            to_version,
            actor,
        })
        .await?;

    Ok(Json(result.version))
}

// ════════════════════════════════════════════════════════════════════════════════
// Impact Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /plans/:id/impact-analysis - Analyze a proposed change
pub async fn analyze_change(
    State(state): State<PlanChangeAppState>,
    ActorHeader(actor): ActorHeader,
    Path(plan_id): Path<String>,
    payload: Result<Json<ProposedChange>, JsonRejection>,
) -> Result<impl IntoResponse, PlanChangeApiError> {
    let plan_id = parse_id(&plan_id, "plan_id")?;
    let Json(change) = payload?;

    let report = state
        .analyze_handler()
        .handle(AnalyzeChangeCommand {
            plan_id,
            change,
            actor,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ImpactReportResponse::from(report))))
}

/// GET /impact-reports/:id - Stored impact report
pub async fn get_impact_report(
    State(state): State<PlanChangeAppState>,
    Path(report_id): Path<String>,
) -> Result<impl IntoResponse, PlanChangeApiError> {
    let report_id = parse_id(&report_id, "impact_report_id")?;
    let report = state
        .get_report_handler()
        .handle(GetImpactReportQuery { report_id })
        .await?;
    Ok(Json(ImpactReportResponse::from(report)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Migration Plan Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /plans/:id/migration-plans - Build a draft migration plan
pub async fn build_migration_plan(
    State(state): State<PlanChangeAppState>,
    ActorHeader(actor): ActorHeader,
    Path(plan_id): Path<String>,
    payload: Result<Json<BuildMigrationPlanRequest>, JsonRejection>,
) -> Result<impl IntoResponse, PlanChangeApiError> {
    let plan_id = parse_id(&plan_id, "plan_id")?;
    let Json(request) = payload?;

    let plan = state
        .build_handler()
        .handle(BuildMigrationPlanCommand {
            plan_id,
            impact_report_id: request.impact_report_id,
            candidates: request.candidates,
            actor,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(MigrationPlanResponse::from(plan))))
}

/// GET /migration-plans/:id - Migration plan state
pub async fn get_migration_plan(
    State(state): State<PlanChangeAppState>,
    Path(migration_plan_id): Path<String>,
) -> Result<impl IntoResponse, PlanChangeApiError> {
    let migration_plan_id = parse_id(&migration_plan_id, "migration_plan_id")?;
    let plan = state
        .get_migration_plan_handler()
        .handle(GetMigrationPlanQuery { migration_plan_id })
        .await?;
    Ok(Json(MigrationPlanResponse::from(plan)))
}

/// PUT /migration-plans/:id/assignments/:subscription_id - Manual target assignment
pub async fn assign_target(
    State(state): State<PlanChangeAppState>,
    ActorHeader(actor): ActorHeader,
    Path((migration_plan_id, subscription_id)): Path<(String, String)>,
    payload: Result<Json<AssignTargetRequest>, JsonRejection>,
) -> Result<impl IntoResponse, PlanChangeApiError> {
    let migration_plan_id = parse_id(&migration_plan_id, "migration_plan_id")?;
    let subscription_id = parse_id(&subscription_id, "subscription_id")?;
    let Json(request) = payload?;

    let plan = state
        .assign_handler()
        .handle(AssignManuallyCommand {
            migration_plan_id,
            subscription_id,
            target_plan_id: request.target_plan_id,
            actor,
        })
        .await?;

    Ok(Json(MigrationPlanResponse::from(plan)))
}

/// POST /migration-plans/:id/approve - Approve a draft
pub async fn approve_migration(
    State(state): State<PlanChangeAppState>,
    ActorHeader(actor): ActorHeader,
    Path(migration_plan_id): Path<String>,
) -> Result<impl IntoResponse, PlanChangeApiError> {
    let migration_plan_id = parse_id(&migration_plan_id, "migration_plan_id")?;
    let plan = state
        .approve_handler()
        .handle(ApproveMigrationCommand {
            migration_plan_id,
            actor,
        })
        .await?;
    Ok(Json(MigrationPlanResponse::from(plan)))
}

/// POST /migration-plans/:id/execute - Run an approved plan to completion
///
/// The run is spawned so a dropped connection cannot abandon it mid-flight;
/// the response waits for the outcome.
pub async fn execute_migration(
    State(state): State<PlanChangeAppState>,
    ActorHeader(actor): ActorHeader,
    Path(migration_plan_id): Path<String>,
) -> Result<impl IntoResponse, PlanChangeApiError> {
    let migration_plan_id = parse_id(&migration_plan_id, "migration_plan_id")?;
    let handler = state.execute_handler();
    let cmd = ExecuteMigrationCommand {
        migration_plan_id,
        actor,
    };

    let result = tokio::spawn(async move { handler.handle(cmd).await })
        .await
        .map_err(|e| PlanChangeError::infrastructure(format!("execution task failed: {}", e)))??;

    Ok(Json(MigrationPlanResponse::new(result.plan, Some(result.summary))))
}

/// POST /migration-plans/:id/cancel - Stop a running execution
pub async fn cancel_migration(
    State(state): State<PlanChangeAppState>,
    ActorHeader(actor): ActorHeader,
    Path(migration_plan_id): Path<String>,
) -> Result<impl IntoResponse, PlanChangeApiError> {
    let migration_plan_id = parse_id(&migration_plan_id, "migration_plan_id")?;
    let plan = state
        .cancel_handler()
        .handle(CancelMigrationCommand {
            migration_plan_id,
            actor,
        })
        .await?;
    Ok((StatusCode::ACCEPTED, Json(MigrationPlanResponse::from(plan))))
}

/// POST /migration-plans/:id/rollback - Revert a finished run
pub async fn rollback_migration(
    State(state): State<PlanChangeAppState>,
    ActorHeader(actor): ActorHeader,
    Path(migration_plan_id): Path<String>,
) -> Result<impl IntoResponse, PlanChangeApiError> {
    let migration_plan_id = parse_id(&migration_plan_id, "migration_plan_id")?;
    let (plan, summary) = state
        .rollback_handler()
        .handle(RollbackMigrationCommand {
            migration_plan_id,
            actor,
        })
        .await?;
    Ok(Json(MigrationPlanResponse::new(plan, summary)))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts engine errors to HTTP responses.
#[derive(Debug)]
pub struct PlanChangeApiError(PlanChangeError);

impl From<PlanChangeError> for PlanChangeApiError {
    fn from(err: PlanChangeError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for PlanChangeApiError {
    fn from(err: DomainError) -> Self {
        Self(err.into())
    }
}

impl From<ValidationError> for PlanChangeApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl From<JsonRejection> for PlanChangeApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(PlanChangeError::validation("body", rejection.body_text()))
    }
}

impl IntoResponse for PlanChangeApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            PlanChangeError::Validation { .. } => StatusCode::BAD_REQUEST,
            PlanChangeError::NotFound { .. } => StatusCode::NOT_FOUND,
            PlanChangeError::Conflict { .. } | PlanChangeError::StaleData { .. } => {
                StatusCode::CONFLICT
            }
            PlanChangeError::Execution { .. } => StatusCode::BAD_GATEWAY,
            PlanChangeError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let code = self.0.code();
        let message = self.0.message();
        let body = match &self.0 {
            PlanChangeError::Validation { field, .. } => {
                ErrorResponse::with_details(code.to_string(), message, json!({ "field": field }))
            }
            PlanChangeError::Execution {
                subscription_id: Some(id),
                ..
            }
            | PlanChangeError::StaleData {
                subscription_id: Some(id),
                ..
            } => ErrorResponse::with_details(
                code.to_string(),
                message,
                json!({ "subscription_id": id }),
            ),
            PlanChangeError::Infrastructure(_) => {
                tracing::error!(error = %message, "Request failed");
                ErrorResponse::new(ErrorCode::InternalError.to_string(), "Internal server error")
            }
            _ => ErrorResponse::new(code.to_string(), message),
        };

        (status, Json(body)).into_response()
    }
}

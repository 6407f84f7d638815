//! GetImpactReportHandler - Query handler for stored reports.

use std::sync::Arc;

use crate::domain::foundation::ImpactReportId;
use crate::domain::impact::ImpactReport;
use crate::domain::PlanChangeError;
use crate::ports::ImpactReportRepository;

#[derive(Debug, Clone)]
pub struct GetImpactReportQuery {
    pub report_id: ImpactReportId,
}

pub struct GetImpactReportHandler {
    reports: Arc<dyn ImpactReportRepository>,
}

impl GetImpactReportHandler {
    pub fn new(reports: Arc<dyn ImpactReportRepository>) -> Self {
        Self { reports }
    }

    pub async fn handle(&self, query: GetImpactReportQuery) -> Result<ImpactReport, PlanChangeError> {
        self.reports
            .find_by_id(query.report_id)
            .await?
            .ok_or_else(|| PlanChangeError::report_not_found(query.report_id))
    }
}

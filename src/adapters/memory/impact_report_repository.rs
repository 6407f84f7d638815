//! In-memory impact report repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, ImpactReportId};
use crate::domain::impact::ImpactReport;
use crate::ports::ImpactReportRepository;

use super::lock;

#[derive(Default)]
pub struct InMemoryImpactReportRepository {
    reports: Mutex<HashMap<ImpactReportId, ImpactReport>>,
}

impl InMemoryImpactReportRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImpactReportRepository for InMemoryImpactReportRepository {
    async fn save(&self, report: &ImpactReport) -> Result<(), DomainError> {
        let mut reports = lock(&self.reports, "impact reports")?;
        if reports.contains_key(&report.id) {
            return Err(DomainError::validation(
                "id",
                format!("Impact report {} is immutable", report.id),
            ));
        }
        reports.insert(report.id, report.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ImpactReportId) -> Result<Option<ImpactReport>, DomainError> {
        Ok(lock(&self.reports, "impact reports")?.get(&id).cloned())
    }
}

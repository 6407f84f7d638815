//! Impact report repository port.
//!
//! Reports are audit records: saved once, read many times, never updated.

use crate::domain::foundation::{DomainError, ImpactReportId};
use crate::domain::impact::ImpactReport;
use async_trait::async_trait;

#[async_trait]
pub trait ImpactReportRepository: Send + Sync {
    /// Persist a new report.
    async fn save(&self, report: &ImpactReport) -> Result<(), DomainError>;

    /// Find a report by id. Returns `None` if not found.
    async fn find_by_id(&self, id: ImpactReportId) -> Result<Option<ImpactReport>, DomainError>;
}

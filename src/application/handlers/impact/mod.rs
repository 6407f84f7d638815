//! Impact handlers.
//!
//! ## Commands
//! - Analyzing a proposed change (persists an immutable report)
//!
//! ## Queries
//! - Get impact report

mod analyze_change;
mod get_impact_report;

pub use analyze_change::{AnalyzeChangeCommand, AnalyzeChangeHandler};
pub use get_impact_report::{GetImpactReportHandler, GetImpactReportQuery};

//! Impact module - What a proposed plan change would do.
//!
//! - `change` - The closed set of proposed changes, their validation and application
//! - `risk` - Fixed risk policy
//! - `recommendations` - Operator guidance templates
//! - `analyzer` - Pure report computation

mod analyzer;
mod change;
mod recommendations;
mod report;
mod risk;

pub use analyzer::ImpactAnalyzer;
pub use change::{
    ChangeType, FeatureRemoval, LimitReduction, PlanDisable, PricingChange, ProposedChange,
};
pub use recommendations::recommendations_for;
pub use report::ImpactReport;
pub use risk::{assess_risk, RiskLevel};

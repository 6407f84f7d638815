//! Migration plan status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle of a migration plan.
///
/// ```text
/// draft -> approved -> executing -> completed -> rolled_back
///                               \-> failed    -> rolled_back
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    /// Assignments may still change.
    Draft,
    /// Frozen and waiting to run.
    Approved,
    /// Steps are being applied.
    Executing,
    Completed,
    /// Failure rate exceeded; compensation pending.
    Failed,
    RolledBack,
}

impl MigrationStatus {
    /// Approved and executing plans hold the per-plan migration slot.
    pub fn is_active(&self) -> bool {
        matches!(self, MigrationStatus::Approved | MigrationStatus::Executing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStatus::Draft => "draft",
            MigrationStatus::Approved => "approved",
            MigrationStatus::Executing => "executing",
            MigrationStatus::Completed => "completed",
            MigrationStatus::Failed => "failed",
            MigrationStatus::RolledBack => "rolled_back",
        }
    }
}

impl StateMachine for MigrationStatus {
    fn valid_transitions(&self) -> &'static [Self] {
        use MigrationStatus::*;
        match self {
            Draft => &[Approved],
            Approved => &[Executing],
            Executing => &[Completed, Failed],
            Completed => &[RolledBack],
            Failed => &[RolledBack],
            RolledBack => &[],
        }
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(MigrationStatus::Draft),
            "approved" => Ok(MigrationStatus::Approved),
            "executing" => Ok(MigrationStatus::Executing),
            "completed" => Ok(MigrationStatus::Completed),
            "failed" => Ok(MigrationStatus::Failed),
            "rolled_back" => Ok(MigrationStatus::RolledBack),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown migration status '{}'", other),
            )),
        }
    }
}

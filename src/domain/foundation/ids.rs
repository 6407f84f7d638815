//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Declares a UUID-backed identifier newtype.
///
/// Identifiers are ordered so they can key `BTreeMap`s, which keeps
/// migration plans and reports deterministic when serialized.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a subscription plan.
    PlanId
);

uuid_id!(
    /// Unique identifier for a workspace subscription.
    SubscriptionId
);

uuid_id!(
    /// Unique identifier for a tenant workspace.
    WorkspaceId
);

uuid_id!(
    /// Unique identifier for a persisted impact report.
    ImpactReportId
);

uuid_id!(
    /// Unique identifier for a migration plan.
    MigrationPlanId
);

/// Operator identifier (typically from the auth provider).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Creates a new ActorId, returning error if empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("actor_id"));
        }
        Ok(Self(id))
    }

    /// Actor used for changes the engine makes on its own behalf
    /// (automatic compensating rollbacks).
    pub fn system() -> Self {
        Self("system".to_string())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_id_generates_unique_values() {
        let id1 = PlanId::new();
        let id2 = PlanId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn subscription_id_parses_from_valid_string() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id: SubscriptionId = uuid_str.parse().unwrap();
        assert_eq!(id.to_string(), uuid_str);
    }

    #[test]
    fn migration_plan_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = MigrationPlanId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), &uuid);
    }

    #[test]
    fn impact_report_id_serializes_to_json() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id: ImpactReportId = uuid_str.parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid_str));
    }

    #[test]
    fn ids_order_by_uuid() {
        let low: PlanId = "00000000-0000-0000-0000-000000000001".parse().unwrap();
        let high: PlanId = "00000000-0000-0000-0000-000000000002".parse().unwrap();
        assert!(low < high);
    }

    #[test]
    fn workspace_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<WorkspaceId>().is_err());
    }

    #[test]
    fn actor_id_accepts_non_empty_string() {
        let id = ActorId::new("ops@example.com").unwrap();
        assert_eq!(id.as_str(), "ops@example.com");
    }

    #[test]
    fn actor_id_rejects_blank_string() {
        match ActorId::new("   ") {
            Err(ValidationError::EmptyField { field }) => assert_eq!(field, "actor_id"),
            other => panic!("Expected EmptyField error, got {:?}", other),
        }
    }
}

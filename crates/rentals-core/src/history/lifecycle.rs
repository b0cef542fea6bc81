//! Lifecycle events: discrete, named occurrences in a property's life.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::model::ParseEnumError;
use crate::model::property::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEventType {
    /// Property registered.
    Created,
    /// A rental contract now references the property.
    ContractLinked,
    /// The contract reference was removed.
    ContractUnlinked,
    TenantMoveIn,
    TenantMoveOut,
    /// Deletion marker. The property itself is never removed.
    Deleted,
}

impl LifecycleEventType {
    pub const ALL: [Self; 6] = [
        Self::Created,
        Self::ContractLinked,
        Self::ContractUnlinked,
        Self::TenantMoveIn,
        Self::TenantMoveOut,
        Self::Deleted,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::ContractLinked => "contract_linked",
            Self::ContractUnlinked => "contract_unlinked",
            Self::TenantMoveIn => "tenant_move_in",
            Self::TenantMoveOut => "tenant_move_out",
            Self::Deleted => "deleted",
        }
    }

    /// Types only the property service itself may append.
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        matches!(self, Self::Created | Self::Deleted)
    }
}

impl fmt::Display for LifecycleEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleEventType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                expected: "event type",
                got: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub id: Uuid,
    pub property_id: Uuid,
    pub event_type: LifecycleEventType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    pub recorded_by: String,
    pub occurred_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl LifecycleEvent {
    #[must_use]
    pub fn new(
        property_id: Uuid,
        event_type: LifecycleEventType,
        description: impl Into<String>,
        recorded_by: &str,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            property_id,
            event_type,
            description: description.into(),
            impact: None,
            recorded_by: recorded_by.to_string(),
            occurred_at,
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_impact(mut self, impact: Option<String>) -> Self {
        self.impact = impact;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: BTreeMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::InvalidEnumValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Unknown,
    Placed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Unknown => "unknown",
            ExecutionStatus::Placed => "placed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::Unknown)
    }

    /// Forward-only: Unknown may move to any terminal state, a terminal
    /// state may only be restated, never changed.
    pub fn can_transition_to(&self, next: ExecutionStatus) -> bool {
        match self {
            ExecutionStatus::Unknown => true,
            terminal => *terminal == next,
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(ExecutionStatus::Unknown),
            "placed" => Ok(ExecutionStatus::Placed),
            "failed" => Ok(ExecutionStatus::Failed),
            "cancelled" => Ok(ExecutionStatus::Cancelled),
            other => Err(InvalidEnumValue {
                kind: "execution status",
                value: other.to_string(),
            }),
        }
    }
}

/// What one device did with one approval. Keyed by (approval_id, device_id);
/// the UNIQUE constraint in the schema is what makes concurrent acks safe.
#[derive(Debug, Clone)]
pub struct Execution {
    pub approval_id: Uuid,
    pub device_id: Uuid,
    pub status: ExecutionStatus,
    pub broker_ticket: Option<String>,
    pub error: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
    pub recorded_at: DateTime<Utc>,
}

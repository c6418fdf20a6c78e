use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::InvalidEnumValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
        }
    }
}

impl FromStr for Decision {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(Decision::Approved),
            "rejected" => Ok(Decision::Rejected),
            other => Err(InvalidEnumValue {
                kind: "decision",
                value: other.to_string(),
            }),
        }
    }
}

/// An owner decision that one signal may be acted on by one client's devices.
/// At most one approval exists per (signal_id, client_id).
#[derive(Debug, Clone)]
pub struct Approval {
    pub approval_id: Uuid,
    pub signal_id: Uuid,
    pub client_id: Uuid,
    pub decision: Decision,
    pub consent_version: i64,
    pub created_at: DateTime<Utc>,
}

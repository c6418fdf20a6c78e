use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::InvalidEnumValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    SlHit,
    TpHit,
    Manual,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::SlHit => "sl_hit",
            CloseReason::TpHit => "tp_hit",
            CloseReason::Manual => "manual",
        }
    }
}

impl FromStr for CloseReason {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sl_hit" => Ok(CloseReason::SlHit),
            "tp_hit" => Ok(CloseReason::TpHit),
            "manual" => Ok(CloseReason::Manual),
            other => Err(InvalidEnumValue {
                kind: "close reason",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle of a server-initiated close. Pending until the device acks,
/// then terminally Closed or Failed under the same restate-only rule as
/// execution statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseState {
    Pending,
    Closed,
    Failed,
}

impl CloseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseState::Pending => "pending",
            CloseState::Closed => "closed",
            CloseState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CloseState::Pending)
    }

    pub fn can_transition_to(&self, next: CloseState) -> bool {
        match self {
            CloseState::Pending => next.is_terminal(),
            terminal => *terminal == next,
        }
    }
}

impl FromStr for CloseState {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CloseState::Pending),
            "closed" => Ok(CloseState::Closed),
            "failed" => Ok(CloseState::Failed),
            other => Err(InvalidEnumValue {
                kind: "close state",
                value: other.to_string(),
            }),
        }
    }
}

/// A server-initiated request that a device close the position it opened for
/// one approval. Created by external collaborators (owner action or the
/// SL/TP watcher); this service only distributes and records the outcome.
#[derive(Debug, Clone)]
pub struct CloseRequest {
    pub close_id: Uuid,
    pub approval_id: Uuid,
    pub device_id: Uuid,
    pub reason: CloseReason,
    pub expected_price: f64,
    pub state: CloseState,
    pub actual_close_price: Option<f64>,
    pub error: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub acked_at: Option<DateTime<Utc>>,
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::models::{
    Approval, CloseReason, CloseRequest, CloseState, Execution, ExecutionStatus, Side, Signal,
};

/// One pending trade command as the device is allowed to see it. This struct
/// is the confidentiality boundary: the owner-only stop/target levels have no
/// field here and can never serialize out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCommand {
    pub approval_id: Uuid,
    pub signal_id: Uuid,
    pub instrument: String,
    pub side: Side,
    pub entry_price: f64,
    pub volume: f64,
}

impl DeviceCommand {
    pub fn from_pair(approval: &Approval, signal: &Signal) -> Self {
        Self {
            approval_id: approval.approval_id,
            signal_id: signal.signal_id,
            instrument: signal.instrument.clone(),
            side: signal.side,
            entry_price: signal.entry_price,
            volume: signal.volume,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResponse {
    pub commands: Vec<DeviceCommand>,
    pub count: usize,
}

/// Terminal outcomes a device may report. `unknown` is not on the wire;
/// deserialization rejects it before any business logic runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    Placed,
    Failed,
    Cancelled,
}

impl From<AckStatus> for ExecutionStatus {
    fn from(status: AckStatus) -> Self {
        match status {
            AckStatus::Placed => ExecutionStatus::Placed,
            AckStatus::Failed => ExecutionStatus::Failed,
            AckStatus::Cancelled => ExecutionStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AckRequest {
    pub approval_id: Uuid,
    pub status: AckStatus,
    pub broker_ticket: Option<String>,
    pub error: Option<String>,
    /// Unix seconds, device clock.
    pub executed_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AckResponse {
    pub approval_id: Uuid,
    pub device_id: Uuid,
    pub status: ExecutionStatus,
    /// Unix seconds, server clock.
    pub recorded_at: i64,
}

impl AckResponse {
    pub fn from_execution(execution: &Execution) -> Self {
        Self {
            approval_id: execution.approval_id,
            device_id: execution.device_id,
            status: execution.status,
            recorded_at: execution.recorded_at.timestamp(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseCommand {
    pub close_id: Uuid,
    pub approval_id: Uuid,
    pub reason: CloseReason,
    pub expected_price: f64,
}

impl CloseCommand {
    pub fn from_request(request: &CloseRequest) -> Self {
        Self {
            close_id: request.close_id,
            approval_id: request.approval_id,
            reason: request.reason,
            expected_price: request.expected_price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseCommandsResponse {
    pub commands: Vec<CloseCommand>,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseAckStatus {
    Closed,
    Failed,
}

impl From<CloseAckStatus> for CloseState {
    fn from(status: CloseAckStatus) -> Self {
        match status {
            CloseAckStatus::Closed => CloseState::Closed,
            CloseAckStatus::Failed => CloseState::Failed,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloseAckRequest {
    pub close_id: Uuid,
    pub status: CloseAckStatus,
    pub actual_close_price: Option<f64>,
    pub error: Option<String>,
    /// Unix seconds, device clock.
    pub executed_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloseAckResponse {
    pub close_id: Uuid,
    pub device_id: Uuid,
    pub status: CloseState,
    /// Unix seconds, server clock.
    pub recorded_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn device_command_has_no_owner_fields() {
        let signal = Signal {
            signal_id: Uuid::new_v4(),
            instrument: "XAUUSD".to_string(),
            side: Side::Sell,
            entry_price: 2411.5,
            volume: 0.25,
            owner_stop_loss: Some(2440.0),
            owner_take_profit: Some(2350.0),
            created_at: Utc::now(),
        };
        let approval = Approval {
            approval_id: Uuid::new_v4(),
            signal_id: signal.signal_id,
            client_id: Uuid::new_v4(),
            decision: common::models::Decision::Approved,
            consent_version: 3,
            created_at: Utc::now(),
        };

        let rendered =
            serde_json::to_string(&DeviceCommand::from_pair(&approval, &signal)).unwrap();
        assert!(!rendered.contains("2440"));
        assert!(!rendered.contains("2350"));
        assert!(!rendered.contains("stop"));
        assert!(!rendered.contains("profit"));
    }

    #[test]
    fn ack_status_rejects_unknown_on_the_wire() {
        assert!(serde_json::from_str::<AckStatus>("\"unknown\"").is_err());
        assert_eq!(
            serde_json::from_str::<AckStatus>("\"placed\"").unwrap(),
            AckStatus::Placed
        );
    }
}

use chrono::DateTime;
use sqlx::SqlitePool;
use tracing::{info, warn};

use common::models::{DeviceIdentity, ExecutionStatus};
use storage::repositories::{AckWrite, ApprovalRepository, ExecutionRepository};

use crate::errors::DispatchError;
use crate::wire::{AckRequest, AckResponse};

/// Records what a device did with an approval. Retried acks from flaky
/// device networks are the normal case, so the write path is idempotent;
/// a device contradicting its own earlier report is not, and is rejected.
pub struct AckService {
    pool: SqlitePool,
}

impl AckService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        identity: &DeviceIdentity,
        request: &AckRequest,
    ) -> Result<AckResponse, DispatchError> {
        let approval = ApprovalRepository::find_approved_for_client(
            &self.pool,
            &request.approval_id,
            &identity.client_id,
        )
        .await?
        .ok_or(DispatchError::ApprovalNotFound(request.approval_id))?;

        let executed_at = DateTime::from_timestamp(request.executed_at, 0);

        let write = ExecutionRepository::record_ack(
            &self.pool,
            &approval.approval_id,
            &identity.device_id,
            request.status.into(),
            request.broker_ticket.as_deref(),
            request.error.as_deref(),
            executed_at,
        )
        .await?;

        match write {
            AckWrite::Recorded(execution) => {
                info!(
                    "device {} acked approval {} as {}",
                    identity.device_id,
                    execution.approval_id,
                    execution.status.as_str()
                );
                Ok(AckResponse::from_execution(&execution))
            }
            AckWrite::Conflict(stored) => {
                warn!(
                    "device {} tried to restate approval {} ({} -> {})",
                    identity.device_id,
                    stored.approval_id,
                    stored.status.as_str(),
                    ExecutionStatus::from(request.status).as_str()
                );
                Err(DispatchError::ConflictingExecution {
                    approval_id: stored.approval_id,
                    stored: stored.status,
                })
            }
        }
    }
}

use chrono::DateTime;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use common::models::DeviceIdentity;
use storage::repositories::{CloseAckWrite, CloseRepository};

use crate::errors::DispatchError;
use crate::wire::{CloseAckRequest, CloseAckResponse, CloseCommand, CloseCommandsResponse};

/// Server-initiated position closes, distributed and acknowledged with the
/// same shape as the trade protocol: FIFO pending list, idempotent ack,
/// conflict on contradiction.
pub struct CloseService {
    pool: SqlitePool,
}

impl CloseService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn pending_commands(
        &self,
        identity: &DeviceIdentity,
    ) -> Result<CloseCommandsResponse, DispatchError> {
        let pending = CloseRepository::pending_for_device(&self.pool, &identity.device_id).await?;

        let commands: Vec<CloseCommand> = pending.iter().map(CloseCommand::from_request).collect();

        debug!(
            "device {} polled closes: {} pending",
            identity.device_id,
            commands.len()
        );
        let count = commands.len();
        Ok(CloseCommandsResponse { commands, count })
    }

    pub async fn record_ack(
        &self,
        identity: &DeviceIdentity,
        request: &CloseAckRequest,
    ) -> Result<CloseAckResponse, DispatchError> {
        let executed_at = DateTime::from_timestamp(request.executed_at, 0);

        let write = CloseRepository::record_ack(
            &self.pool,
            &request.close_id,
            &identity.device_id,
            request.status.into(),
            request.actual_close_price,
            request.error.as_deref(),
            executed_at,
        )
        .await?;

        match write {
            CloseAckWrite::Recorded(stored) => {
                info!(
                    "device {} settled close {} as {}",
                    identity.device_id,
                    stored.close_id,
                    stored.state.as_str()
                );
                Ok(CloseAckResponse {
                    close_id: stored.close_id,
                    device_id: identity.device_id,
                    status: stored.state,
                    recorded_at: stored
                        .acked_at
                        .map(|t| t.timestamp())
                        .unwrap_or_else(|| chrono::Utc::now().timestamp()),
                })
            }
            CloseAckWrite::Conflict(stored) => {
                warn!(
                    "device {} tried to restate close {} ({})",
                    identity.device_id,
                    stored.close_id,
                    stored.state.as_str()
                );
                Err(DispatchError::ConflictingCloseAck(stored.close_id))
            }
            CloseAckWrite::NotFound => Err(DispatchError::CloseRequestNotFound(request.close_id)),
        }
    }
}

use sqlx::SqlitePool;
use tracing::debug;

use common::models::DeviceIdentity;
use storage::repositories::ApprovalRepository;

use crate::errors::DispatchError;
use crate::wire::{DeviceCommand, PollResponse};

/// Hands an authenticated device its pending commands: approvals for its
/// tenant it has not executed yet, oldest first so a device that was offline
/// never starves old approvals.
pub struct PollService {
    pool: SqlitePool,
}

impl PollService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn pending_commands(
        &self,
        identity: &DeviceIdentity,
    ) -> Result<PollResponse, DispatchError> {
        let pairs = ApprovalRepository::pending_for_device(
            &self.pool,
            &identity.client_id,
            &identity.device_id,
        )
        .await?;

        let commands: Vec<DeviceCommand> = pairs
            .iter()
            .map(|(approval, signal)| DeviceCommand::from_pair(approval, signal))
            .collect();

        debug!(
            "device {} polled: {} pending",
            identity.device_id,
            commands.len()
        );
        let count = commands.len();
        Ok(PollResponse { commands, count })
    }
}

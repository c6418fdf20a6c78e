use thiserror::Error;
use uuid::Uuid;

use common::models::ExecutionStatus;
use storage::StorageError;

/// Business-layer outcomes. Unlike the authentication taxonomy these are
/// reported with detail — the caller already proved who it is.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Missing, not approved, or belonging to another tenant; the three are
    /// indistinguishable on purpose.
    #[error("approval {0} not found")]
    ApprovalNotFound(Uuid),

    #[error("execution for approval {approval_id} already recorded as {stored}")]
    ConflictingExecution {
        approval_id: Uuid,
        stored: ExecutionStatus,
    },

    #[error("close request {0} not found")]
    CloseRequestNotFound(Uuid),

    #[error("close request {0} already settled differently")]
    ConflictingCloseAck(Uuid),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

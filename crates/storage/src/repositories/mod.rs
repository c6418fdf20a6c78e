pub mod approval_repo;
pub mod client_repo;
pub mod close_repo;
pub mod device_repo;
pub mod execution_repo;

pub use approval_repo::ApprovalRepository;
pub use client_repo::ClientRepository;
pub use close_repo::{CloseAckWrite, CloseRepository};
pub use device_repo::DeviceRepository;
pub use execution_repo::{AckWrite, ExecutionRepository};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::StorageError;

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(raw).map_err(|e| StorageError::Corrupt(format!("bad uuid {:?}: {}", raw, e)))
}

pub(crate) fn parse_ts(secs: i64) -> Result<DateTime<Utc>, StorageError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| StorageError::Corrupt(format!("bad timestamp {}", secs)))
}

pub(crate) fn parse_opt_ts(secs: Option<i64>) -> Result<Option<DateTime<Utc>>, StorageError> {
    secs.map(parse_ts).transpose()
}

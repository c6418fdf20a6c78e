use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use auth::{DeviceDirectory, DirectoryError};
use common::models::Device;

use crate::repositories::DeviceRepository;

/// `DeviceDirectory` over the devices table. Errors stay opaque to the
/// authenticator; it fails closed on any of them.
pub struct SqliteDeviceDirectory {
    pool: SqlitePool,
}

impl SqliteDeviceDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceDirectory for SqliteDeviceDirectory {
    async fn find_device(&self, device_id: &Uuid) -> Result<Option<Device>, DirectoryError> {
        DeviceRepository::find(&self.pool, device_id)
            .await
            .map_err(|e| DirectoryError(e.to_string()))
    }

    async fn touch_last_seen(&self, device_id: &Uuid) -> Result<(), DirectoryError> {
        DeviceRepository::touch_last_seen(&self.pool, device_id)
            .await
            .map_err(|e| DirectoryError(e.to_string()))
    }
}

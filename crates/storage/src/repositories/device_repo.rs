use chrono::Utc;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use common::models::Device;

use crate::errors::StorageError;
use crate::repositories::{parse_opt_ts, parse_uuid};

pub struct DeviceRepository;

impl DeviceRepository {
    /// Inserts a freshly provisioned device. The caller hashes the shared
    /// secret before it gets here; the raw secret never reaches storage.
    /// The UNIQUE constraint on `secret_key_hash` rejects key reuse.
    pub async fn provision(
        pool: &SqlitePool,
        device_id: &Uuid,
        client_id: &Uuid,
        secret_key_hash: &[u8],
    ) -> Result<(), StorageError> {
        sqlx::query(
            r#"
                INSERT INTO devices (device_id, client_id, secret_key_hash, is_active, revoked, created_at)
                VALUES (?, ?, ?, 1, 0, ?)
            "#,
        )
        .bind(device_id.to_string())
        .bind(client_id.to_string())
        .bind(secret_key_hash)
        .bind(Utc::now().timestamp())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find(
        pool: &SqlitePool,
        device_id: &Uuid,
    ) -> Result<Option<Device>, StorageError> {
        let row = sqlx::query(
            r#"
                SELECT device_id, client_id, secret_key_hash, is_active, revoked, last_seen
                FROM devices WHERE device_id = ?
            "#,
        )
        .bind(device_id.to_string())
        .fetch_optional(pool)
        .await?;

        row.map(Self::from_row).transpose()
    }

    pub async fn touch_last_seen(
        pool: &SqlitePool,
        device_id: &Uuid,
    ) -> Result<(), StorageError> {
        sqlx::query("UPDATE devices SET last_seen = ? WHERE device_id = ?")
            .bind(Utc::now().timestamp())
            .bind(device_id.to_string())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Monotone: there is deliberately no way to clear this flag. A revoked
    /// terminal gets a new device row or nothing.
    pub async fn revoke(pool: &SqlitePool, device_id: &Uuid) -> Result<(), StorageError> {
        sqlx::query("UPDATE devices SET revoked = 1 WHERE device_id = ?")
            .bind(device_id.to_string())
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_active(
        pool: &SqlitePool,
        device_id: &Uuid,
        is_active: bool,
    ) -> Result<(), StorageError> {
        sqlx::query("UPDATE devices SET is_active = ? WHERE device_id = ?")
            .bind(is_active)
            .bind(device_id.to_string())
            .execute(pool)
            .await?;
        Ok(())
    }

    fn from_row(row: SqliteRow) -> Result<Device, StorageError> {
        Ok(Device {
            device_id: parse_uuid(row.get("device_id"))?,
            client_id: parse_uuid(row.get("client_id"))?,
            secret_key_hash: row.get("secret_key_hash"),
            is_active: row.get("is_active"),
            revoked: row.get("revoked"),
            last_seen: parse_opt_ts(row.get("last_seen"))?,
        })
    }
}

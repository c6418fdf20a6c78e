use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use common::models::{CloseReason, CloseRequest, CloseState};

use crate::errors::StorageError;
use crate::repositories::{parse_opt_ts, parse_ts, parse_uuid};

#[derive(Debug)]
pub enum CloseAckWrite {
    Recorded(CloseRequest),
    Conflict(CloseRequest),
    /// No pending or acked close request for (close_id, device_id). A close
    /// targeting another device reports the same.
    NotFound,
}

pub struct CloseRepository;

impl CloseRepository {
    /// Close requests come from external collaborators (owner action, SL/TP
    /// watcher); this insert is their write path and the test fixture.
    pub async fn create(pool: &SqlitePool, request: &CloseRequest) -> Result<(), StorageError> {
        sqlx::query(
            r#"
                INSERT INTO close_requests (close_id, approval_id, device_id, reason,
                                            expected_price, state, created_at)
                VALUES (?, ?, ?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(request.close_id.to_string())
        .bind(request.approval_id.to_string())
        .bind(request.device_id.to_string())
        .bind(request.reason.as_str())
        .bind(request.expected_price)
        .bind(request.created_at.timestamp())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn pending_for_device(
        pool: &SqlitePool,
        device_id: &Uuid,
    ) -> Result<Vec<CloseRequest>, StorageError> {
        let rows = sqlx::query(
            r#"
                SELECT close_id, approval_id, device_id, reason, expected_price, state,
                       actual_close_price, error, executed_at, created_at, acked_at
                FROM close_requests
                WHERE device_id = ? AND state = 'pending'
                ORDER BY created_at ASC
            "#,
        )
        .bind(device_id.to_string())
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(Self::from_row).collect()
    }

    /// Same shape as the execution ack: a guarded single-statement update
    /// settles the pending row exactly once, restating the settled outcome is
    /// a no-op, contradicting it is a conflict.
    pub async fn record_ack(
        pool: &SqlitePool,
        close_id: &Uuid,
        device_id: &Uuid,
        state: CloseState,
        actual_close_price: Option<f64>,
        error: Option<&str>,
        executed_at: Option<DateTime<Utc>>,
    ) -> Result<CloseAckWrite, StorageError> {
        let acked_at = Utc::now();

        let settled = sqlx::query(
            r#"
                UPDATE close_requests
                SET state = ?, actual_close_price = ?, error = ?, executed_at = ?, acked_at = ?
                WHERE close_id = ? AND device_id = ? AND state = 'pending'
            "#,
        )
        .bind(state.as_str())
        .bind(actual_close_price)
        .bind(error)
        .bind(executed_at.map(|t| t.timestamp()))
        .bind(acked_at.timestamp())
        .bind(close_id.to_string())
        .bind(device_id.to_string())
        .execute(pool)
        .await?
        .rows_affected();

        let Some(existing) = Self::find_for_device(pool, close_id, device_id).await? else {
            return Ok(CloseAckWrite::NotFound);
        };

        if settled == 1 {
            return Ok(CloseAckWrite::Recorded(existing));
        }

        let same_price = existing.actual_close_price == actual_close_price;
        if existing.state == state && same_price {
            Ok(CloseAckWrite::Recorded(existing))
        } else {
            Ok(CloseAckWrite::Conflict(existing))
        }
    }

    pub async fn find_for_device(
        pool: &SqlitePool,
        close_id: &Uuid,
        device_id: &Uuid,
    ) -> Result<Option<CloseRequest>, StorageError> {
        let row = sqlx::query(
            r#"
                SELECT close_id, approval_id, device_id, reason, expected_price, state,
                       actual_close_price, error, executed_at, created_at, acked_at
                FROM close_requests
                WHERE close_id = ? AND device_id = ?
            "#,
        )
        .bind(close_id.to_string())
        .bind(device_id.to_string())
        .fetch_optional(pool)
        .await?;

        row.map(Self::from_row).transpose()
    }

    fn from_row(row: SqliteRow) -> Result<CloseRequest, StorageError> {
        Ok(CloseRequest {
            close_id: parse_uuid(row.get("close_id"))?,
            approval_id: parse_uuid(row.get("approval_id"))?,
            device_id: parse_uuid(row.get("device_id"))?,
            reason: row.get::<&str, _>("reason").parse::<CloseReason>()?,
            expected_price: row.get("expected_price"),
            state: row.get::<&str, _>("state").parse::<CloseState>()?,
            actual_close_price: row.get("actual_close_price"),
            error: row.get("error"),
            executed_at: parse_opt_ts(row.get("executed_at"))?,
            created_at: parse_ts(row.get("created_at"))?,
            acked_at: parse_opt_ts(row.get("acked_at"))?,
        })
    }
}

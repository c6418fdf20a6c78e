use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use common::models::{Execution, ExecutionStatus};

use crate::errors::StorageError;
use crate::repositories::{parse_opt_ts, parse_ts, parse_uuid};

/// Outcome of an ack write. `Conflict` carries the stored row so the caller
/// can report what the device disagreed with; the row itself is untouched.
#[derive(Debug)]
pub enum AckWrite {
    Recorded(Execution),
    Conflict(Execution),
}

pub struct ExecutionRepository;

impl ExecutionRepository {
    /// Idempotent upsert keyed (approval_id, device_id).
    ///
    /// The UNIQUE constraint makes the insert race-safe across replicas:
    /// two concurrent first acks resolve to one inserted row and one
    /// conflict-path read, never two rows. Restating the stored outcome is a
    /// no-op; contradicting it is a conflict.
    pub async fn record_ack(
        pool: &SqlitePool,
        approval_id: &Uuid,
        device_id: &Uuid,
        status: ExecutionStatus,
        broker_ticket: Option<&str>,
        error: Option<&str>,
        executed_at: Option<DateTime<Utc>>,
    ) -> Result<AckWrite, StorageError> {
        let recorded_at = Utc::now();

        let inserted = sqlx::query(
            r#"
                INSERT INTO executions (approval_id, device_id, status, broker_ticket,
                                        error, executed_at, recorded_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(approval_id, device_id) DO NOTHING
            "#,
        )
        .bind(approval_id.to_string())
        .bind(device_id.to_string())
        .bind(status.as_str())
        .bind(broker_ticket)
        .bind(error)
        .bind(executed_at.map(|t| t.timestamp()))
        .bind(recorded_at.timestamp())
        .execute(pool)
        .await?
        .rows_affected();

        let existing = Self::get(pool, approval_id, device_id)
            .await?
            .ok_or_else(|| {
                StorageError::Corrupt(format!(
                    "execution ({}, {}) vanished after upsert",
                    approval_id, device_id
                ))
            })?;

        if inserted == 1 {
            return Ok(AckWrite::Recorded(existing));
        }

        // A pre-created placeholder may move forward exactly once.
        if existing.status == ExecutionStatus::Unknown && existing.status.can_transition_to(status)
        {
            let advanced = sqlx::query(
                r#"
                    UPDATE executions
                    SET status = ?, broker_ticket = ?, error = ?, executed_at = ?, recorded_at = ?
                    WHERE approval_id = ? AND device_id = ? AND status = 'unknown'
                "#,
            )
            .bind(status.as_str())
            .bind(broker_ticket)
            .bind(error)
            .bind(executed_at.map(|t| t.timestamp()))
            .bind(recorded_at.timestamp())
            .bind(approval_id.to_string())
            .bind(device_id.to_string())
            .execute(pool)
            .await?
            .rows_affected();

            if advanced == 1 {
                let updated = Self::get(pool, approval_id, device_id).await?.ok_or_else(|| {
                    StorageError::Corrupt(format!(
                        "execution ({}, {}) vanished after update",
                        approval_id, device_id
                    ))
                })?;
                return Ok(AckWrite::Recorded(updated));
            }
            // Lost the race against another writer; fall through and judge
            // the row that won.
            let settled = Self::get(pool, approval_id, device_id).await?.ok_or_else(|| {
                StorageError::Corrupt(format!(
                    "execution ({}, {}) vanished mid-race",
                    approval_id, device_id
                ))
            })?;
            return Ok(Self::judge(settled, status, broker_ticket));
        }

        Ok(Self::judge(existing, status, broker_ticket))
    }

    fn judge(existing: Execution, status: ExecutionStatus, broker_ticket: Option<&str>) -> AckWrite {
        let same_ticket = existing.broker_ticket.as_deref() == broker_ticket;
        if existing.status == status && same_ticket {
            AckWrite::Recorded(existing)
        } else {
            AckWrite::Conflict(existing)
        }
    }

    pub async fn get(
        pool: &SqlitePool,
        approval_id: &Uuid,
        device_id: &Uuid,
    ) -> Result<Option<Execution>, StorageError> {
        let row = sqlx::query(
            r#"
                SELECT approval_id, device_id, status, broker_ticket, error,
                       executed_at, recorded_at
                FROM executions
                WHERE approval_id = ? AND device_id = ?
            "#,
        )
        .bind(approval_id.to_string())
        .bind(device_id.to_string())
        .fetch_optional(pool)
        .await?;

        row.map(Self::from_row).transpose()
    }

    fn from_row(row: SqliteRow) -> Result<Execution, StorageError> {
        Ok(Execution {
            approval_id: parse_uuid(row.get("approval_id"))?,
            device_id: parse_uuid(row.get("device_id"))?,
            status: row.get::<&str, _>("status").parse::<ExecutionStatus>()?,
            broker_ticket: row.get("broker_ticket"),
            error: row.get("error"),
            executed_at: parse_opt_ts(row.get("executed_at"))?,
            recorded_at: parse_ts(row.get("recorded_at"))?,
        })
    }
}

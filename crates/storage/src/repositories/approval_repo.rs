use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use common::models::{Approval, Decision, Signal, Side};

use crate::errors::StorageError;
use crate::repositories::{parse_ts, parse_uuid};

pub struct ApprovalRepository;

impl ApprovalRepository {
    pub async fn create_signal(pool: &SqlitePool, signal: &Signal) -> Result<(), StorageError> {
        sqlx::query(
            r#"
                INSERT INTO signals (signal_id, instrument, side, entry_price, volume,
                                     owner_stop_loss, owner_take_profit, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(signal.signal_id.to_string())
        .bind(&signal.instrument)
        .bind(signal.side.as_str())
        .bind(signal.entry_price)
        .bind(signal.volume)
        .bind(signal.owner_stop_loss)
        .bind(signal.owner_take_profit)
        .bind(signal.created_at.timestamp())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// One decision per (signal, client); the UNIQUE constraint backs that up.
    pub async fn create_approval(
        pool: &SqlitePool,
        approval: &Approval,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r#"
                INSERT INTO approvals (approval_id, signal_id, client_id, decision,
                                       consent_version, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(approval.approval_id.to_string())
        .bind(approval.signal_id.to_string())
        .bind(approval.client_id.to_string())
        .bind(approval.decision.as_str())
        .bind(approval.consent_version)
        .bind(approval.created_at.timestamp())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Approved signals for one tenant that the requesting device has not
    /// acted on yet, oldest approval first. Another device's execution on the
    /// same approval does not hide it from this one.
    pub async fn pending_for_device(
        pool: &SqlitePool,
        client_id: &Uuid,
        device_id: &Uuid,
    ) -> Result<Vec<(Approval, Signal)>, StorageError> {
        let rows = sqlx::query(
            r#"
                SELECT a.approval_id, a.signal_id, a.client_id, a.decision,
                       a.consent_version, a.created_at,
                       s.instrument, s.side, s.entry_price, s.volume,
                       s.owner_stop_loss, s.owner_take_profit,
                       s.created_at AS signal_created_at
                FROM approvals a
                JOIN signals s ON s.signal_id = a.signal_id
                WHERE a.decision = 'approved'
                  AND a.client_id = ?
                  AND NOT EXISTS (
                      SELECT 1 FROM executions e
                      WHERE e.approval_id = a.approval_id AND e.device_id = ?
                  )
                ORDER BY a.created_at ASC
            "#,
        )
        .bind(client_id.to_string())
        .bind(device_id.to_string())
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(Self::pair_from_row).collect()
    }

    /// Lookup scoped to the caller's tenant: an approval belonging to another
    /// client comes back as None, indistinguishable from a true miss.
    pub async fn find_approved_for_client(
        pool: &SqlitePool,
        approval_id: &Uuid,
        client_id: &Uuid,
    ) -> Result<Option<Approval>, StorageError> {
        let row = sqlx::query(
            r#"
                SELECT approval_id, signal_id, client_id, decision, consent_version, created_at
                FROM approvals
                WHERE approval_id = ? AND client_id = ? AND decision = 'approved'
            "#,
        )
        .bind(approval_id.to_string())
        .bind(client_id.to_string())
        .fetch_optional(pool)
        .await?;

        row.map(Self::approval_from_row).transpose()
    }

    fn approval_from_row(row: SqliteRow) -> Result<Approval, StorageError> {
        Ok(Approval {
            approval_id: parse_uuid(row.get("approval_id"))?,
            signal_id: parse_uuid(row.get("signal_id"))?,
            client_id: parse_uuid(row.get("client_id"))?,
            decision: row.get::<&str, _>("decision").parse::<Decision>()?,
            consent_version: row.get("consent_version"),
            created_at: parse_ts(row.get("created_at"))?,
        })
    }

    fn pair_from_row(row: SqliteRow) -> Result<(Approval, Signal), StorageError> {
        let signal = Signal {
            signal_id: parse_uuid(row.get("signal_id"))?,
            instrument: row.get("instrument"),
            side: row.get::<&str, _>("side").parse::<Side>()?,
            entry_price: row.get("entry_price"),
            volume: row.get("volume"),
            owner_stop_loss: row.get("owner_stop_loss"),
            owner_take_profit: row.get("owner_take_profit"),
            created_at: parse_ts(row.get("signal_created_at"))?,
        };
        let approval = Self::approval_from_row(row)?;
        Ok((approval, signal))
    }
}

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tokio::time;
use tracing::{debug, warn};

use auth::{ReplayStore, ReplayStoreError};

/// Shared replay store for multi-replica deployments: every replica runs the
/// same atomic conditional insert against one nonce table. A reservation is
/// a row; an expired row may be overwritten in the same statement, so the
/// purge task is housekeeping only, not a correctness requirement.
pub struct SqliteReplayStore {
    pool: SqlitePool,
}

impl SqliteReplayStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Periodically drops expired reservations so the table does not grow
    /// without bound.
    pub fn spawn_purge_task(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let pool = self.pool.clone();
        tokio::spawn(async move {
            let mut tick = time::interval(every);
            loop {
                tick.tick().await;
                match sqlx::query("DELETE FROM nonces WHERE expires_at <= ?")
                    .bind(Utc::now().timestamp())
                    .execute(&pool)
                    .await
                {
                    Ok(done) => {
                        if done.rows_affected() > 0 {
                            debug!("purged {} expired nonces", done.rows_affected());
                        }
                    }
                    Err(e) => warn!("nonce purge failed: {}", e),
                }
            }
        })
    }
}

#[async_trait]
impl ReplayStore for SqliteReplayStore {
    async fn reserve(&self, key: &str, ttl: Duration) -> Result<bool, ReplayStoreError> {
        let now = Utc::now().timestamp();
        let expires_at = now + ttl.as_secs() as i64;

        // Single statement: insert wins, or an expired row is taken over.
        // A live row leaves rows_affected at zero.
        let reserved = sqlx::query(
            r#"
                INSERT INTO nonces (key, expires_at) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET expires_at = ?2
                WHERE nonces.expires_at <= ?3
            "#,
        )
        .bind(key)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| ReplayStoreError(e.to_string()))?
        .rows_affected();

        Ok(reserved == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_test_pool;
    use auth::NONCE_TTL;

    #[tokio::test]
    async fn reserve_is_first_writer_wins() {
        let pool = open_test_pool().await.unwrap();
        let store = SqliteReplayStore::new(pool);

        assert!(store.reserve("d1:n1", NONCE_TTL).await.unwrap());
        assert!(!store.reserve("d1:n1", NONCE_TTL).await.unwrap());
        assert!(store.reserve("d1:n2", NONCE_TTL).await.unwrap());
    }

    #[tokio::test]
    async fn expired_reservation_can_be_taken_over() {
        let pool = open_test_pool().await.unwrap();
        let store = SqliteReplayStore::new(pool);

        assert!(store.reserve("d1:n1", Duration::ZERO).await.unwrap());
        assert!(store.reserve("d1:n1", NONCE_TTL).await.unwrap());
        assert!(!store.reserve("d1:n1", NONCE_TTL).await.unwrap());
    }
}

use sqlx::SqlitePool;

use common::models::Client;

use crate::errors::StorageError;

pub struct ClientRepository;

impl ClientRepository {
    pub async fn create(pool: &SqlitePool, client: &Client) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO clients (client_id, created_at) VALUES (?, ?)")
            .bind(client.client_id.to_string())
            .bind(client.created_at.timestamp())
            .execute(pool)
            .await?;
        Ok(())
    }
}

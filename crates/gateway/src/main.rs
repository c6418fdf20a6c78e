use std::env;
use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use tracing::info;

use auth::DeviceAuthenticator;
use common::logger;
use dispatch::{AckService, CloseService, PollService};
use storage::{SqliteDeviceDirectory, SqliteReplayStore};

use crate::router::AppState;

mod router;

const NONCE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::setup_logger();
    dotenv().ok();
    info!("relay starting up...");

    let data_folder = env::var("WORKDIR")?;
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8787".to_string());

    let pool = storage::db::open_pool(&data_folder).await?;

    let replay_store = Arc::new(SqliteReplayStore::new(pool.clone()));
    let _purge_task = replay_store.spawn_purge_task(NONCE_PURGE_INTERVAL);

    let authenticator = Arc::new(DeviceAuthenticator::new(
        Arc::new(SqliteDeviceDirectory::new(pool.clone())),
        replay_store,
    ));

    let state = AppState {
        authenticator,
        poll: Arc::new(PollService::new(pool.clone())),
        ack: Arc::new(AckService::new(pool.clone())),
        close: Arc::new(CloseService::new(pool)),
    };

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("listening on {}", bind_addr);
    axum::serve(listener, router::router(state)).await?;
    Ok(())
}

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use serde::Serialize;
use tracing::warn;

use auth::{DeviceAuthenticator, SignedRequest};
use common::errors::AuthError;
use common::models::DeviceIdentity;
use dispatch::wire::{AckRequest, CloseAckRequest};
use dispatch::{AckService, CloseService, DispatchError, PollService};

#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<DeviceAuthenticator>,
    pub poll: Arc<PollService>,
    pub ack: Arc<AckService>,
    pub close: Arc<CloseService>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

type Rejection = (StatusCode, Json<ErrorBody>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/poll", post(poll))
        .route("/ack", post(ack))
        .route("/close-commands", post(close_commands))
        .route("/close-ack", post(close_ack))
        .with_state(state)
}

/// Every auth rejection looks the same on the wire; the variant only goes to
/// the log. Telling an attacker which check failed would hand them a probe.
fn reject_auth(path: &str, err: AuthError) -> Rejection {
    warn!("auth rejected on {}: {}", path, err);
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody {
            error: err.public_message().to_string(),
        }),
    )
}

fn reject_dispatch(err: DispatchError) -> Rejection {
    let status = match &err {
        DispatchError::ApprovalNotFound(_) | DispatchError::CloseRequestNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        DispatchError::ConflictingExecution { .. } | DispatchError::ConflictingCloseAck(_) => {
            StatusCode::CONFLICT
        }
        DispatchError::Storage(e) => {
            warn!("storage failure: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "internal error".to_string(),
                }),
            );
        }
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

fn bad_payload(err: serde_json::Error) -> Rejection {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: format!("malformed payload: {}", err),
        }),
    )
}

async fn authenticate(
    state: &AppState,
    request: &SignedRequest,
    path: &'static str,
) -> Result<DeviceIdentity, Rejection> {
    state
        .authenticator
        .authenticate(request, "POST", path)
        .await
        .map_err(|e| reject_auth(path, e))
}

async fn poll(
    State(state): State<AppState>,
    Json(request): Json<SignedRequest>,
) -> Result<Json<dispatch::wire::PollResponse>, Rejection> {
    let identity = authenticate(&state, &request, "/poll").await?;
    let response = state
        .poll
        .pending_commands(&identity)
        .await
        .map_err(reject_dispatch)?;
    Ok(Json(response))
}

async fn ack(
    State(state): State<AppState>,
    Json(request): Json<SignedRequest>,
) -> Result<Json<dispatch::wire::AckResponse>, Rejection> {
    let identity = authenticate(&state, &request, "/ack").await?;
    let payload: AckRequest =
        serde_json::from_value(request.payload.clone()).map_err(bad_payload)?;
    let response = state
        .ack
        .record(&identity, &payload)
        .await
        .map_err(reject_dispatch)?;
    Ok(Json(response))
}

async fn close_commands(
    State(state): State<AppState>,
    Json(request): Json<SignedRequest>,
) -> Result<Json<dispatch::wire::CloseCommandsResponse>, Rejection> {
    let identity = authenticate(&state, &request, "/close-commands").await?;
    let response = state
        .close
        .pending_commands(&identity)
        .await
        .map_err(reject_dispatch)?;
    Ok(Json(response))
}

async fn close_ack(
    State(state): State<AppState>,
    Json(request): Json<SignedRequest>,
) -> Result<Json<dispatch::wire::CloseAckResponse>, Rejection> {
    let identity = authenticate(&state, &request, "/close-ack").await?;
    let payload: CloseAckRequest =
        serde_json::from_value(request.payload.clone()).map_err(bad_payload)?;
    let response = state
        .close
        .record_ack(&identity, &payload)
        .await
        .map_err(reject_dispatch)?;
    Ok(Json(response))
}

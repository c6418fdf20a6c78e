use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use common::errors::AuthError;
use common::models::{Device, DeviceIdentity};

use crate::envelope::SignedRequest;
use crate::replay::{NONCE_TTL, ReplayStore, nonce_key};
use crate::signature;
use crate::timestamp;

#[derive(Debug, Error)]
#[error("device directory error: {0}")]
pub struct DirectoryError(pub String);

/// Read side of the device registry. Provisioning and revocation happen in
/// external admin flows; authentication only ever consumes lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    async fn find_device(&self, device_id: &Uuid) -> Result<Option<Device>, DirectoryError>;

    /// Best effort; a failed touch never fails the request.
    async fn touch_last_seen(&self, device_id: &Uuid) -> Result<(), DirectoryError>;
}

/// Runs the full check pipeline for one request: signature, then timestamp,
/// then replay reservation, then the active/revoked veto. The order is part
/// of the protocol — replay reservation costs I/O and is only attempted once
/// the request is plausible, and revocation is always the last word.
///
/// Every request runs the pipeline from scratch; there is no cached
/// "trusted" state between calls.
pub struct DeviceAuthenticator {
    directory: Arc<dyn DeviceDirectory>,
    replay_store: Arc<dyn ReplayStore>,
}

impl DeviceAuthenticator {
    pub fn new(directory: Arc<dyn DeviceDirectory>, replay_store: Arc<dyn ReplayStore>) -> Self {
        Self {
            directory,
            replay_store,
        }
    }

    pub async fn authenticate(
        &self,
        request: &SignedRequest,
        method: &str,
        path: &str,
    ) -> Result<DeviceIdentity, AuthError> {
        let device = self
            .directory
            .find_device(&request.device_id)
            .await
            .map_err(|e| AuthError::Lookup(e.to_string()))?
            .ok_or(AuthError::UnknownDevice)?;

        let canonical = signature::canonical_string(
            &request.device_id,
            request.timestamp,
            &request.nonce,
            method,
            path,
            &request.canonical_payload(),
        );
        signature::verify(&device.secret_key_hash, &canonical, &request.signature)?;

        timestamp::check_freshness(request.timestamp, Utc::now().timestamp())?;

        let key = nonce_key(&request.device_id, &request.nonce);
        match self.replay_store.reserve(&key, NONCE_TTL).await {
            Ok(true) => {}
            Ok(false) => return Err(AuthError::Replay),
            Err(e) => {
                // Fail closed: an unreachable replay store rejects the
                // request rather than waving it through.
                warn!("replay store error, rejecting request: {}", e);
                return Err(AuthError::Replay);
            }
        }

        if device.revoked {
            return Err(AuthError::DeviceRevoked);
        }
        if !device.is_active {
            return Err(AuthError::DeviceInactive);
        }

        if let Err(e) = self.directory.touch_last_seen(&request.device_id).await {
            warn!("failed to update last_seen for {}: {}", request.device_id, e);
        }

        debug!("device {} authenticated on {}", device.device_id, path);
        Ok(DeviceIdentity {
            device_id: device.device_id,
            client_id: device.client_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::replay::{InMemoryReplayStore, ReplayStoreError};

    const SECRET: &str = "0f9b2c4d6e8a0c2e4f6a8b0d2f4a6c8e0a2c4e6f8a0b2d4f6a8c0e2f4a6b8d0e";

    /// Stands in for an unreachable nonce cache.
    struct DownReplayStore;

    #[async_trait]
    impl ReplayStore for DownReplayStore {
        async fn reserve(&self, _key: &str, _ttl: Duration) -> Result<bool, ReplayStoreError> {
            Err(ReplayStoreError("connection refused".to_string()))
        }
    }

    fn device(device_id: Uuid, client_id: Uuid) -> Device {
        Device {
            device_id,
            client_id,
            secret_key_hash: signature::derive_key(SECRET).to_vec(),
            is_active: true,
            revoked: false,
            last_seen: None,
        }
    }

    fn signed_request(device_id: Uuid, timestamp: i64, nonce: &str) -> SignedRequest {
        let key = signature::derive_key(SECRET);
        let canonical =
            signature::canonical_string(&device_id, timestamp, nonce, "POST", "/poll", "{}");
        SignedRequest {
            device_id,
            timestamp,
            nonce: nonce.to_string(),
            signature: signature::sign(&key, &canonical),
            payload: serde_json::json!({}),
        }
    }

    fn directory_returning(device: Device) -> MockDeviceDirectory {
        let mut directory = MockDeviceDirectory::new();
        directory
            .expect_find_device()
            .returning(move |_| Ok(Some(device.clone())));
        directory.expect_touch_last_seen().returning(|_| Ok(()));
        directory
    }

    fn authenticator(directory: MockDeviceDirectory) -> DeviceAuthenticator {
        DeviceAuthenticator::new(Arc::new(directory), Arc::new(InMemoryReplayStore::new()))
    }

    #[tokio::test]
    async fn valid_request_authenticates_once_then_replays_fail() {
        let device_id = Uuid::new_v4();
        let client_id = Uuid::new_v4();
        let auth = authenticator(directory_returning(device(device_id, client_id)));
        let request = signed_request(device_id, Utc::now().timestamp(), "n1");

        let identity = auth.authenticate(&request, "POST", "/poll").await.unwrap();
        assert_eq!(identity.device_id, device_id);
        assert_eq!(identity.client_id, client_id);

        // Identical tuple a second time: replay.
        let err = auth
            .authenticate(&request, "POST", "/poll")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Replay));
    }

    #[tokio::test]
    async fn stale_and_future_timestamps_rejected_despite_valid_signature() {
        let device_id = Uuid::new_v4();
        let auth = authenticator(directory_returning(device(device_id, Uuid::new_v4())));

        let stale = signed_request(device_id, Utc::now().timestamp() - 301, "n-stale");
        assert!(matches!(
            auth.authenticate(&stale, "POST", "/poll").await,
            Err(AuthError::StaleTimestamp)
        ));

        let future = signed_request(device_id, Utc::now().timestamp() + 301, "n-future");
        assert!(matches!(
            auth.authenticate(&future, "POST", "/poll").await,
            Err(AuthError::FutureTimestamp)
        ));
    }

    #[tokio::test]
    async fn revoked_device_is_rejected_with_otherwise_valid_request() {
        let device_id = Uuid::new_v4();
        let mut revoked = device(device_id, Uuid::new_v4());
        revoked.revoked = true;

        let mut directory = MockDeviceDirectory::new();
        directory
            .expect_find_device()
            .returning(move |_| Ok(Some(revoked.clone())));

        let auth = authenticator(directory);
        let request = signed_request(device_id, Utc::now().timestamp(), "n1");
        assert!(matches!(
            auth.authenticate(&request, "POST", "/poll").await,
            Err(AuthError::DeviceRevoked)
        ));
    }

    #[tokio::test]
    async fn inactive_device_is_rejected() {
        let device_id = Uuid::new_v4();
        let mut inactive = device(device_id, Uuid::new_v4());
        inactive.is_active = false;

        let mut directory = MockDeviceDirectory::new();
        directory
            .expect_find_device()
            .returning(move |_| Ok(Some(inactive.clone())));

        let auth = authenticator(directory);
        let request = signed_request(device_id, Utc::now().timestamp(), "n1");
        assert!(matches!(
            auth.authenticate(&request, "POST", "/poll").await,
            Err(AuthError::DeviceInactive)
        ));
    }

    #[tokio::test]
    async fn unknown_device_is_rejected() {
        let mut directory = MockDeviceDirectory::new();
        directory.expect_find_device().returning(|_| Ok(None));

        let auth = authenticator(directory);
        let request = signed_request(Uuid::new_v4(), Utc::now().timestamp(), "n1");
        assert!(matches!(
            auth.authenticate(&request, "POST", "/poll").await,
            Err(AuthError::UnknownDevice)
        ));
    }

    #[tokio::test]
    async fn bad_signature_rejected_before_any_nonce_is_burned() {
        let device_id = Uuid::new_v4();
        let auth = authenticator(directory_returning(device(device_id, Uuid::new_v4())));

        let mut request = signed_request(device_id, Utc::now().timestamp(), "n1");
        request.signature = "deadbeef".to_string();
        assert!(matches!(
            auth.authenticate(&request, "POST", "/poll").await,
            Err(AuthError::Signature)
        ));

        // The nonce was not reserved by the garbage request.
        let good = signed_request(device_id, Utc::now().timestamp(), "n1");
        assert!(auth.authenticate(&good, "POST", "/poll").await.is_ok());
    }

    #[tokio::test]
    async fn signature_over_wrong_path_is_rejected() {
        let device_id = Uuid::new_v4();
        let auth = authenticator(directory_returning(device(device_id, Uuid::new_v4())));

        let request = signed_request(device_id, Utc::now().timestamp(), "n1");
        assert!(matches!(
            auth.authenticate(&request, "POST", "/ack").await,
            Err(AuthError::Signature)
        ));
    }

    #[tokio::test]
    async fn replay_inside_timestamp_window_is_still_rejected() {
        // Nonce used at t0 and replayed 100s later: the timestamp guard
        // alone would accept it, the replay guard must not.
        let device_id = Uuid::new_v4();
        let auth = authenticator(directory_returning(device(device_id, Uuid::new_v4())));

        let t0 = Utc::now().timestamp() - 100;
        let request = signed_request(device_id, t0, "n1");
        assert!(auth.authenticate(&request, "POST", "/poll").await.is_ok());
        assert!(matches!(
            auth.authenticate(&request, "POST", "/poll").await,
            Err(AuthError::Replay)
        ));
    }

    #[tokio::test]
    async fn unreachable_replay_store_fails_closed() {
        // A perfectly valid request is still rejected when the nonce cache
        // cannot answer; "probably fresh" is not an option.
        let device_id = Uuid::new_v4();
        let auth = DeviceAuthenticator::new(
            Arc::new(directory_returning(device(device_id, Uuid::new_v4()))),
            Arc::new(DownReplayStore),
        );

        let request = signed_request(device_id, Utc::now().timestamp(), "n1");
        assert!(matches!(
            auth.authenticate(&request, "POST", "/poll").await,
            Err(AuthError::Replay)
        ));
    }

    #[tokio::test]
    async fn successful_authentication_touches_last_seen_exactly_once() {
        let device_id = Uuid::new_v4();
        let tracked = device(device_id, Uuid::new_v4());

        let mut directory = MockDeviceDirectory::new();
        directory
            .expect_find_device()
            .returning(move |_| Ok(Some(tracked.clone())));
        directory
            .expect_touch_last_seen()
            .times(1)
            .returning(|_| Ok(()));

        let auth = authenticator(directory);
        let request = signed_request(device_id, Utc::now().timestamp(), "n1");
        assert!(auth.authenticate(&request, "POST", "/poll").await.is_ok());
    }
}

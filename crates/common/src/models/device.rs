use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A provisioned trading-terminal client.
///
/// `secret_key_hash` is the SHA-256 of the 64-hex shared secret and doubles
/// as the HMAC verification key; the raw secret is never stored. Revocation
/// is monotone: a revoked device never becomes trusted again, re-provisioning
/// creates a new row.
#[derive(Debug, Clone)]
pub struct Device {
    pub device_id: Uuid,
    pub client_id: Uuid,
    pub secret_key_hash: Vec<u8>,
    pub is_active: bool,
    pub revoked: bool,
    pub last_seen: Option<DateTime<Utc>>,
}

/// Proof that the full authentication pipeline passed for one request.
/// The only identity the poll/ack services ever see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    pub device_id: Uuid,
    pub client_id: Uuid,
}

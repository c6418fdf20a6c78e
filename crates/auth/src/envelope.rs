use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

/// The authentication envelope every device request arrives in. `payload`
/// holds the operation body and is signed along with the envelope fields;
/// operations without a body send `{}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SignedRequest {
    pub device_id: Uuid,
    /// Unix seconds, device clock.
    pub timestamp: i64,
    pub nonce: String,
    /// Hex HMAC-SHA256 over the canonical string.
    pub signature: String,
    #[serde(default = "empty_payload")]
    pub payload: Value,
}

fn empty_payload() -> Value {
    Value::Object(serde_json::Map::new())
}

impl SignedRequest {
    /// Compact re-rendering of the payload. serde_json's map is ordered, so
    /// this is deterministic regardless of the key order the device sent;
    /// devices sign the key-sorted compact rendering.
    pub fn canonical_payload(&self) -> String {
        serde_json::to_string(&self.payload).unwrap_or_else(|_| "{}".to_string())
    }
}

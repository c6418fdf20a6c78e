use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use common::errors::AuthError;

type HmacSha256 = Hmac<Sha256>;

const FIELD_DELIMITER: &str = "\n";

/// Derives the HMAC key from the 64-hex shared secret handed to a device at
/// provisioning. Only the digest is ever stored; the device runs the same
/// derivation locally.
pub fn derive_key(secret_hex: &str) -> [u8; 32] {
    Sha256::digest(secret_hex.as_bytes()).into()
}

/// The deterministic string both sides sign. Every position is mandatory;
/// `payload_json` is the compact, key-sorted rendering of the request payload
/// (`"{}"` for operations without one).
pub fn canonical_string(
    device_id: &Uuid,
    timestamp: i64,
    nonce: &str,
    method: &str,
    path: &str,
    payload_json: &str,
) -> String {
    [
        device_id.to_string(),
        timestamp.to_string(),
        nonce.to_string(),
        method.to_uppercase(),
        path.to_string(),
        payload_json.to_string(),
    ]
    .join(FIELD_DELIMITER)
}

/// Hex signature over a canonical string. Client-side half of the protocol;
/// the server only uses it in tests and provisioning tooling.
pub fn sign(key: &[u8], canonical: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time verification. Malformed hex, wrong length and plain
/// mismatch are indistinguishable to the caller.
pub fn verify(key: &[u8], canonical: &str, supplied_hex: &str) -> Result<(), AuthError> {
    let supplied = hex::decode(supplied_hex).map_err(|_| AuthError::Signature)?;

    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(canonical.as_bytes());
    mac.verify_slice(&supplied).map_err(|_| AuthError::Signature)
}

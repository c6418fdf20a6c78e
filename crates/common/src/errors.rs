use thiserror::Error;

/// Message returned to the wire for every authentication-layer rejection.
/// Which check failed is deliberately not disclosed.
pub const AUTH_FAILED_MSG: &str = "authentication failed";

/// Outcome of the device authentication pipeline.
///
/// The variants stay distinct for logging and tests; callers facing the
/// device must collapse them through [`AuthError::public_message`].
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed, wrong-length or mismatched HMAC. One variant on purpose.
    #[error("signature rejected")]
    Signature,

    #[error("timestamp too old")]
    StaleTimestamp,

    #[error("timestamp too far in the future")]
    FutureTimestamp,

    /// Nonce already reserved, or the replay store was unreachable
    /// (fail closed).
    #[error("nonce rejected")]
    Replay,

    #[error("unknown device")]
    UnknownDevice,

    #[error("device revoked")]
    DeviceRevoked,

    #[error("device inactive")]
    DeviceInactive,

    #[error("device lookup failed: {0}")]
    Lookup(String),
}

impl AuthError {
    pub fn public_message(&self) -> &'static str {
        AUTH_FAILED_MSG
    }
}

/// Raised when a stored enum column holds a value no variant maps to.
#[derive(Debug, Error)]
#[error("invalid {kind} value: {value}")]
pub struct InvalidEnumValue {
    pub kind: &'static str,
    pub value: String,
}

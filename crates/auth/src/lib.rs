pub mod authenticator;
pub mod envelope;
pub mod replay;
pub mod signature;
pub mod timestamp;

pub use authenticator::{DeviceAuthenticator, DeviceDirectory, DirectoryError};
pub use envelope::SignedRequest;
pub use replay::{InMemoryReplayStore, NONCE_TTL, ReplayStore, ReplayStoreError, nonce_key};

pub mod db;
pub mod directory;
pub mod errors;
pub mod replay_store;
pub mod repositories;

pub use directory::SqliteDeviceDirectory;
pub use errors::StorageError;
pub use replay_store::SqliteReplayStore;

use thiserror::Error;

use common::errors::InvalidEnumValue;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    /// A stored value no longer maps onto the domain model.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<InvalidEnumValue> for StorageError {
    fn from(e: InvalidEnumValue) -> Self {
        StorageError::Corrupt(e.to_string())
    }
}

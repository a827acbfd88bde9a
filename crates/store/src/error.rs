use thiserror::Error;

use firefleet_core::DomainError;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A document with the same id already exists in the collection.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored body could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backing store failed (connection, poisoned lock, SQL error).
    #[error("backend error: {0}")]
    Backend(String),

    /// An update mutator refused the change.
    #[error(transparent)]
    Rejected(#[from] DomainError),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

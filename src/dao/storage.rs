use std::error::Error;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A uniqueness constraint rejected the write.
    #[error("duplicate value for unique field `{field}`")]
    Duplicate { field: &'static str },
    /// A record referenced by a write vanished before it could be applied.
    #[error("{entity} `{id}` does not exist")]
    Missing { entity: &'static str, id: Uuid },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Name of the unique field that rejected the write, if any.
    pub fn duplicate_field(&self) -> Option<&'static str> {
        match self {
            StorageError::Duplicate { field } => Some(field),
            _ => None,
        }
    }
}

mod config;
mod connection;
mod error;
mod models;
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoArcadeStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::Duplicate { field } => StorageError::Duplicate { field },
            MongoDaoError::Missing { entity, id } => StorageError::Missing { entity, id },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}

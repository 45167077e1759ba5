use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Server error code reported for unique index violations.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("unique index rejected write on `{field}`")]
    Duplicate { field: &'static str },
    #[error("{entity} `{id}` does not exist")]
    Missing { entity: &'static str, id: Uuid },
    #[error("stored identifier `{value}` in `{collection}` is not a UUID")]
    CorruptId {
        collection: &'static str,
        value: String,
        #[source]
        source: uuid::Error,
    },
    #[error("failed to write to `{collection}`")]
    Write {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to query `{collection}`")]
    Query {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("match transaction failed")]
    Transaction {
        #[source]
        source: MongoError,
    },
}

impl MongoDaoError {
    /// Classify a write failure, turning unique index violations into [`MongoDaoError::Duplicate`].
    ///
    /// `indexes` maps index names to the field reported back to callers.
    pub fn from_write(
        collection: &'static str,
        indexes: &[(&'static str, &'static str)],
        source: MongoError,
    ) -> Self {
        if let Some(message) = duplicate_key_message(&source) {
            let field = indexes
                .iter()
                .find(|(index, _)| message.contains(index))
                .map(|(_, field)| *field)
                .unwrap_or("_id");
            return MongoDaoError::Duplicate { field };
        }
        MongoDaoError::Write { collection, source }
    }
}

/// Server message of a duplicate key failure, if `err` is one.
pub fn duplicate_key_message(err: &MongoError) -> Option<&str> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE => {
            Some(write.message.as_str())
        }
        ErrorKind::Command(command) if command.code == DUPLICATE_KEY_CODE => {
            Some(command.message.as_str())
        }
        _ => None,
    }
}

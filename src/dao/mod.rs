/// Account, friendship and statistics storage backends.
pub mod arcade_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;

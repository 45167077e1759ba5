use std::time::Duration;

use mongodb::{Client, Database, bson::doc, error::Error as MongoError};
use tokio::time::sleep;
use tracing::debug;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

/// Pings tried before giving up on a freshly built client.
const STARTUP_PINGS: u32 = 3;
const PING_PAUSE: Duration = Duration::from_millis(250);

pub async fn ping(database: &Database) -> Result<(), MongoError> {
    database.run_command(doc! { "ping": 1 }).await.map(|_| ())
}

/// Build a client for `config` and return it once the server answers.
///
/// Longer outages are left to the storage supervisor, which calls this again with backoff.
pub async fn open(config: &MongoConfig) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    let mut attempt = 1;
    loop {
        match ping(&database).await {
            Ok(()) => return Ok((client, database)),
            Err(source) if attempt >= STARTUP_PINGS => {
                return Err(MongoDaoError::InitialPing {
                    attempts: attempt,
                    source,
                });
            }
            Err(err) => {
                debug!(attempt, database = %config.database_name, error = %err, "MongoDB not answering yet");
                attempt += 1;
                sleep(PING_PAUSE * attempt).await;
            }
        }
    }
}

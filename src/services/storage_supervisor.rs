//! Keeps a storage backend installed in the shared state.
//!
//! While the backend is unreachable the state is flagged degraded and every storage-backed
//! route answers 503; the supervisor keeps retrying in the background.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    dao::{arcade_store::ArcadeStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Exponential delay capped at [`MAX_DELAY`].
#[derive(Debug, Clone, Copy)]
struct Backoff {
    current: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self {
            current: INITIAL_DELAY,
        }
    }

    /// Delay to wait now; doubles the next one.
    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(MAX_DELAY);
        delay
    }

    fn reset(&mut self) {
        self.current = INITIAL_DELAY;
    }
}

/// Connect with `connect` until it succeeds, then watch the store; start over when it is lost.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn ArcadeStore>, StorageError>> + Send,
{
    let mut backoff = Backoff::new();

    loop {
        match connect().await {
            Ok(store) => {
                state.set_store(store.clone()).await;
                info!("storage connected; serving requests");
                backoff.reset();

                watch(&state, store.as_ref()).await;
                warn!("storage lost; reconnecting from scratch");
            }
            Err(err) => warn!(error = %err, "storage connection attempt failed"),
        }
        sleep(backoff.next_delay()).await;
    }
}

/// Poll the store health until it fails and cannot be revived in place.
async fn watch(state: &SharedState, store: &dyn ArcadeStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false);
                }
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed; entering degraded mode");
                state.update_degraded(true);
                if !revive(store).await {
                    warn!("storage reconnect attempts exhausted; staying in degraded mode");
                    return;
                }
                state.update_degraded(false);
            }
        }
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

async fn revive(store: &dyn ArcadeStore) -> bool {
    let mut backoff = Backoff::new();
    for attempt in 1..=MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnected");
                return true;
            }
            Err(err) => {
                debug!(attempt, error = %err, "storage reconnect attempt failed");
                sleep(backoff.next_delay()).await;
            }
        }
    }
    false
}

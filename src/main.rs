//! Arcade backend entrypoint: configuration, storage selection and the HTTP server.

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, bail};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arcade_back::{
    config::AppConfig,
    dao::arcade_store::memory::MemoryArcadeStore,
    routes,
    state::{AppState, SharedState},
};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);
    install_store(&app_state).await?;
    tokio::spawn(sweep_sessions(app_state.clone()));

    let app = routes::app(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the backend from `ARCADE_STORE` (`mongo` by default when compiled in, else `memory`).
async fn install_store(state: &SharedState) -> anyhow::Result<()> {
    let default_backend = if cfg!(feature = "mongo-store") {
        "mongo"
    } else {
        "memory"
    };
    let backend = env::var("ARCADE_STORE").unwrap_or_else(|_| default_backend.into());

    match backend.trim().to_lowercase().as_str() {
        "memory" => {
            info!("using in-memory storage; data is lost on restart");
            state.set_store(Arc::new(MemoryArcadeStore::new())).await;
        }
        #[cfg(feature = "mongo-store")]
        "mongo" | "mongodb" => {
            use arcade_back::{
                dao::{
                    arcade_store::{
                        ArcadeStore,
                        mongodb::{MongoArcadeStore, MongoConfig},
                    },
                    storage::StorageError,
                },
                services::storage_supervisor,
            };

            let mongo = MongoConfig::from_env()
                .await
                .context("configuring MongoDB")?;
            info!(database = %mongo.database_name, "using MongoDB storage");
            tokio::spawn(storage_supervisor::run(state.clone(), move || {
                let mongo = mongo.clone();
                async move {
                    let store = MongoArcadeStore::connect(mongo)
                        .await
                        .map_err(StorageError::from)?;
                    Ok::<_, StorageError>(Arc::new(store) as Arc<dyn ArcadeStore>)
                }
            }));
        }
        other => bail!("unsupported ARCADE_STORE `{other}`"),
    }
    Ok(())
}

async fn sweep_sessions(state: SharedState) {
    let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        let purged = state.sessions().purge_expired();
        if purged > 0 {
            info!(purged, "expired sessions purged");
        }
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                error!(error = %err, "cannot install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received");
}

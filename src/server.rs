//! Process wiring.
//!
//! Brings up the engine, restores the last snapshot, starts the background
//! workers and serves the HTTP API until Ctrl+C.

use crate::api::{create_router, AppState};
use crate::auth::Authenticator;
use crate::config::ServerConfig;
use crate::storage::{
    ExpiryReaper, FileMedium, ReaperConfig, SnapshotManager, SnapshotWorker, StoreEngine,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

pub struct Server {
    config: ServerConfig,
    engine: Arc<StoreEngine>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            engine: Arc::new(StoreEngine::new()),
        }
    }

    pub fn engine(&self) -> &Arc<StoreEngine> {
        &self.engine
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs until Ctrl+C, then stops the workers and writes a final dump.
    pub async fn run(self) -> Result<(), ServerError> {
        let snapshots = self.config.persistence().map(|(path, interval)| {
            let manager = Arc::new(SnapshotManager::new(
                Arc::clone(&self.engine),
                Arc::new(FileMedium::new(path)),
            ));
            manager.restore();
            (manager, interval)
        });

        let reaper = ExpiryReaper::start(
            Arc::clone(&self.engine),
            ReaperConfig {
                interval: self.config.expiry_tick(),
            },
        );

        let worker: Option<(Arc<SnapshotManager>, SnapshotWorker)> =
            snapshots.map(|(manager, interval)| {
                let worker = Arc::clone(&manager).start(interval);
                (manager, worker)
            });
        if worker.is_none() {
            info!("Persistence disabled");
        }

        let auth = Arc::new(Authenticator::new(
            self.config.users.clone(),
            self.config.secret_key.clone(),
        ));
        if self.config.authorization && self.config.users.is_empty() {
            warn!("Authorization is enabled but no users are configured");
        }

        let state = AppState::new(Arc::clone(&self.engine), auth);
        let app = create_router(state, self.config.authorization);

        let addr = self.config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!(%addr, authorization = self.config.authorization, "Listening");

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        reaper.stop();
        if let Some((manager, worker)) = worker {
            worker.shutdown().await;
            match tokio::task::spawn_blocking(move || manager.dump()).await {
                Ok(Ok(bytes)) => info!(bytes, "Final storage dump written"),
                Ok(Err(e)) => error!(error = %e, "Final storage dump failed"),
                Err(e) => error!(error = %e, "Final storage dump task failed"),
            }
        }

        info!("Server shutdown complete");
        served.map_err(ServerError::from)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping server...");
}

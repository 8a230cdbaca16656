//! Snapshot Persistence
//!
//! The whole store state (key table and expiration table) can be written to a
//! durable medium on a fixed interval and read back once at startup.
//!
//! ## Format
//!
//! A snapshot is a single JSON document replacing the previous one wholesale:
//!
//! ```text
//! {
//!   "data":    { "name": "John", "tags": ["a", "b"], "user": {"id": "7"} },
//!   "expires": { "name": 1767225600000 }
//! }
//! ```
//!
//! Deadlines are absolute Unix epoch milliseconds and are restored as-is.
//! A deadline that passed while the process was down is reaped on the first
//! reaper tick after startup.
//!
//! ## Failure Policy
//!
//! Loading never fails startup: a missing, unreadable or undecodable snapshot
//! is logged and the engine starts empty. A failed dump is logged and the
//! next tick tries again.

use crate::storage::engine::StoreEngine;
use crate::storage::value::Value;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Full copy of the store state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Key table
    #[serde(default)]
    pub data: HashMap<String, Value>,
    /// Expiration table (epoch milliseconds)
    #[serde(default)]
    pub expires: HashMap<String, i64>,
}

impl Snapshot {
    /// Serializes the snapshot.
    pub fn encode(&self) -> Result<Bytes, SnapshotError> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    /// Deserializes a snapshot. Values of any other shape than string,
    /// list of strings or map of strings are rejected.
    pub fn decode(blob: &[u8]) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_slice(blob)?)
    }
}

/// Snapshot failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("snapshot encoding error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("snapshot task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Where snapshots live.
pub trait SnapshotMedium: Send + Sync + 'static {
    /// Reads the current snapshot blob. `Ok(None)` means nothing was ever written.
    fn read(&self) -> io::Result<Option<Bytes>>;

    /// Replaces the stored snapshot with `blob`.
    fn write(&self, blob: &[u8]) -> io::Result<()>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// A snapshot file on the local filesystem.
///
/// Writes go to a sibling `.tmp` file which is then renamed over the target,
/// so readers never observe a partially written snapshot.
#[derive(Debug, Clone)]
pub struct FileMedium {
    path: PathBuf,
}

impl FileMedium {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotMedium for FileMedium {
    fn read(&self) -> io::Result<Option<Bytes>> {
        match std::fs::read(&self.path) {
            Ok(contents) => Ok(Some(Bytes::from(contents))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, blob: &[u8]) -> io::Result<()> {
        let tmp = self.temp_path();
        std::fs::write(&tmp, blob)?;
        std::fs::rename(&tmp, &self.path)
    }

    fn describe(&self) -> String {
        self.path().display().to_string()
    }
}

/// Loads and dumps the state of one engine to one medium.
pub struct SnapshotManager {
    engine: Arc<StoreEngine>,
    medium: Arc<dyn SnapshotMedium>,
}

impl std::fmt::Debug for SnapshotManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotManager")
            .field("medium", &self.medium.describe())
            .finish()
    }
}

impl SnapshotManager {
    pub fn new(engine: Arc<StoreEngine>, medium: Arc<dyn SnapshotMedium>) -> Self {
        Self { engine, medium }
    }

    /// Reads the last snapshot, if there is a usable one.
    pub fn load(&self) -> Option<Snapshot> {
        let blob = match self.medium.read() {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                info!(medium = %self.medium.describe(), "No snapshot found, starting empty");
                return None;
            }
            Err(e) => {
                warn!(medium = %self.medium.describe(), error = %e, "Error loading storage dump");
                return None;
            }
        };

        match Snapshot::decode(&blob) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(medium = %self.medium.describe(), error = %e, "Error decoding storage dump");
                None
            }
        }
    }

    /// Loads the last snapshot into the engine. Returns true if one was applied.
    pub fn restore(&self) -> bool {
        match self.load() {
            Some(snapshot) => {
                let keys = snapshot.data.len();
                self.engine.restore(snapshot);
                info!(medium = %self.medium.describe(), keys, "Storage dump loaded");
                true
            }
            None => false,
        }
    }

    /// Writes the current state to the medium.
    ///
    /// The state is copied under the engine's read guard; encoding and the
    /// write itself happen after the guard is released.
    ///
    /// # Returns
    ///
    /// Returns the number of bytes written.
    pub fn dump(&self) -> Result<usize, SnapshotError> {
        let snapshot = self.engine.snapshot();
        let blob = snapshot.encode()?;
        self.medium.write(&blob)?;

        debug!(
            medium = %self.medium.describe(),
            keys = snapshot.data.len(),
            bytes = blob.len(),
            "Storage dump written"
        );
        Ok(blob.len())
    }

    /// Starts dumping every `interval` on a background task.
    pub fn start(self: Arc<Self>, interval: Duration) -> SnapshotWorker {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            medium = %self.medium.describe(),
            interval_secs = interval.as_secs(),
            "Snapshot worker started"
        );
        let handle = tokio::spawn(dump_loop(self, interval, shutdown_rx));

        SnapshotWorker {
            shutdown_tx,
            handle: Some(handle),
        }
    }
}

/// A handle to the running snapshot worker.
///
/// Dropping the handle stops the worker without waiting for it.
#[derive(Debug)]
pub struct SnapshotWorker {
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl SnapshotWorker {
    /// Stops the worker and waits for an in-flight dump to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Snapshot worker ended abnormally");
            }
        }
        info!("Snapshot worker stopped");
    }
}

impl Drop for SnapshotWorker {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

async fn dump_loop(
    manager: Arc<SnapshotManager>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Snapshot worker received shutdown signal");
                    return;
                }
            }
        }

        let manager = Arc::clone(&manager);
        let outcome = tokio::task::spawn_blocking(move || manager.dump())
            .await
            .map_err(SnapshotError::from)
            .and_then(|r| r);

        if let Err(e) = outcome {
            error!(error = %e, "Error saving storage dump");
        }
    }
}

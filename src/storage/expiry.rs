//! Background Expiry Reaper
//!
//! Deadlines set with `SetExpires` are enforced by a background task that
//! wakes up on a fixed tick, asks the engine for every key whose deadline is
//! at or before now, and removes them through the engine's normal removal path.
//!
//! ## Staleness
//!
//! Reads do not check deadlines themselves. Between a deadline passing and
//! the next tick, the entry is still served by `get` and `get_expires`
//! reports a negative remaining time. With the default 1 second tick that
//! window is at most one second.
//!
//! ## Shutdown
//!
//! The reaper owns a `watch` channel. Calling [`ExpiryReaper::stop`] or
//! dropping the handle ends the task at its next wake-up.

use crate::storage::StoreEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Configuration for the expiry reaper.
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// Interval between sweeps (default: 1s)
    pub interval: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

/// A handle to the running expiry reaper.
///
/// When this handle is dropped, the reaper task will be stopped.
#[derive(Debug)]
pub struct ExpiryReaper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
}

impl ExpiryReaper {
    /// Starts the reaper as a background task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use emberkv::storage::{StoreEngine, ExpiryReaper, ReaperConfig};
    /// use std::sync::Arc;
    ///
    /// let engine = Arc::new(StoreEngine::new());
    /// let reaper = ExpiryReaper::start(engine, ReaperConfig::default());
    ///
    /// // Dropping the reaper will stop it
    /// drop(reaper);
    /// ```
    pub fn start(engine: Arc<StoreEngine>, config: ReaperConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            interval_ms = config.interval.as_millis() as u64,
            "Background expiry reaper started"
        );
        tokio::spawn(reaper_loop(engine, config, shutdown_rx));

        Self { shutdown_tx }
    }

    /// Stops the reaper.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if self.shutdown_tx.send_replace(true) {
            return;
        }
        info!("Background expiry reaper stopped");
    }
}

impl Drop for ExpiryReaper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main reaper loop.
async fn reaper_loop(
    engine: Arc<StoreEngine>,
    config: ReaperConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry reaper received shutdown signal");
                    return;
                }
            }
        }

        let expired = engine.sweep_expired();

        if expired > 0 {
            debug!(
                expired = expired,
                keys_remaining = engine.len(),
                "Expired keys reaped"
            );
        }
    }
}

/// Starts the expiry reaper with default configuration.
pub fn start_expiry_reaper(engine: Arc<StoreEngine>) -> ExpiryReaper {
    ExpiryReaper::start(engine, ReaperConfig::default())
}

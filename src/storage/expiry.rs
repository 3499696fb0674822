//! Background Expiry Sweeper
//!
//! This module implements a background task that periodically scans the
//! store for expired entries and removes them. This is "active expiry", as
//! opposed to the "lazy expiry" `get` performs on access.
//!
//! ## Why Do We Need This?
//!
//! Lazy expiry only catches entries that are read again. An entry that
//! expires and is never read would otherwise sit in memory until LRU
//! eviction happens to reach it.
//!
//! ## Design
//!
//! The sweeper runs as a Tokio task and:
//! 1. Runs one full pass over the recency list, right away on start
//! 2. Logs how many entries it removed
//! 3. Sleeps for the configured interval, then repeats
//!
//! Stopping goes through a `watch` channel. The loop only observes it
//! between passes, so a pass that has started always runs to completion.

use crate::storage::StorageEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Default time between two sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    /// Interval between sweeps (default: 5s)
    pub interval: Duration,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// A running sweep loop.
#[derive(Debug)]
struct Running {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Owns the background sweep loop for one storage engine.
///
/// At most one loop runs per sweeper: `start` on a running sweeper does
/// nothing, and `stop` on a stopped one does nothing. Dropping a running
/// sweeper signals its loop to stop.
#[derive(Debug)]
pub struct ExpirySweeper {
    engine: Arc<StorageEngine>,
    config: ExpiryConfig,
    running: Option<Running>,
}

impl ExpirySweeper {
    /// Creates a stopped sweeper for `engine`.
    pub fn new(engine: Arc<StorageEngine>, config: ExpiryConfig) -> Self {
        Self {
            engine,
            config,
            running: None,
        }
    }

    /// Starts the sweep loop as a background task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Returns
    ///
    /// Returns `true` if a loop was started, `false` if one was already
    /// running.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use flashmc::storage::{ExpiryConfig, ExpirySweeper, StorageEngine};
    /// use std::sync::Arc;
    ///
    /// let engine = Arc::new(StorageEngine::unbounded());
    /// let mut sweeper = ExpirySweeper::new(engine, ExpiryConfig::default());
    ///
    /// assert!(sweeper.start());
    /// assert!(!sweeper.start()); // already running
    ///
    /// sweeper.stop().await;
    /// ```
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            debug!("Expiry sweeper already running");
            return false;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(sweeper_loop(
            Arc::clone(&self.engine),
            self.config.clone(),
            shutdown_rx,
        ));

        self.running = Some(Running { shutdown_tx, task });

        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            "Background expiry sweeper started"
        );
        true
    }

    /// Returns whether the sweep loop is currently running.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .map(|running| !running.task.is_finished())
            .unwrap_or(false)
    }

    /// Stops the sweep loop and waits for it to exit.
    ///
    /// A pass in progress is allowed to finish. Calling this on a stopped
    /// sweeper is a no-op.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        let _ = running.shutdown_tx.send(true);
        if let Err(e) = running.task.await {
            warn!(error = %e, "Expiry sweeper task ended abnormally");
        }

        info!("Background expiry sweeper stopped");
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown_tx.send(true);
        }
    }
}

/// The main sweeper loop.
async fn sweeper_loop(
    engine: Arc<StorageEngine>,
    config: ExpiryConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        let removed = engine.remove_expired();

        if removed > 0 {
            debug!(
                removed = removed,
                keys_remaining = engine.len(),
                "Expired keys cleaned up"
            );
        } else {
            trace!("No expired keys found");
        }

        // Wait for the interval or shutdown signal
        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }
    }
}

/// Creates and starts a sweeper that runs every `interval`.
///
/// This is a convenience function for simple use cases.
pub fn start_expiry_sweeper(engine: Arc<StorageEngine>, interval: Duration) -> ExpirySweeper {
    let mut sweeper = ExpirySweeper::new(engine, ExpiryConfig { interval });
    sweeper.start();
    sweeper
}

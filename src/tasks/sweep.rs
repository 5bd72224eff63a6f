//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries.
//!
//! `get` already self-heals on expired reads, so the sweep only bounds
//! how long dead entries occupy memory between reads.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::fetch::FetchCoordinator;

// == Sweeper ==
/// Periodic expiry sweep with an explicit lifecycle.
///
/// Construct one per coordinator, `start` it on a running tokio runtime,
/// and `stop` it during shutdown. Dropping a running sweeper stops it.
#[derive(Debug)]
pub struct Sweeper {
    /// Interval between sweep runs
    interval: Duration,
    /// Handle of the running sweep loop, if started
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    // == Constructor ==
    /// Creates a stopped sweeper with the given interval in seconds.
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval: Duration::from_secs(interval_secs),
            handle: None,
        }
    }

    /// Creates a stopped sweeper from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.sweep_interval)
    }

    // == Start ==
    /// Spawns the sweep loop against the given coordinator.
    ///
    /// Starting an already-running sweeper is a no-op.
    pub fn start<T>(&mut self, coordinator: Arc<FetchCoordinator<T>>)
    where
        T: Clone + Send + Sync + 'static,
    {
        if self.handle.is_some() {
            return;
        }

        let interval = self.interval;
        self.handle = Some(tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "expiry sweep started");

            loop {
                tokio::time::sleep(interval).await;

                let removed = coordinator.cleanup_expired().await;
                if removed > 0 {
                    info!(removed, "expiry sweep removed entries");
                } else {
                    debug!("expiry sweep found nothing to remove");
                }
            }
        }));
    }

    // == Stop ==
    /// Aborts the sweep loop. Stopping a stopped sweeper is a no-op.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("expiry sweep stopped");
        }
    }

    // == Is Running ==
    /// Returns true while the sweep loop is spawned.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

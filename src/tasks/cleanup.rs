//! Periodic Sweeps
//!
//! Background tasks that expire idle store entries and stale coalescer
//! results for every registered group.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::group::GroupRegistry;

/// Spawns a task that runs `clean_up(ttl)` on every group each `interval`.
///
/// Groups registered after the task starts are picked up on the next tick.
/// The returned handle is aborted on shutdown.
pub fn spawn_cleanup_task(
    registry: GroupRegistry,
    ttl: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(?ttl, ?interval, "starting TTL cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            for group in registry.groups() {
                let removed = group.clean_up(ttl);
                if removed > 0 {
                    info!(group = group.name(), removed, "TTL cleanup removed idle entries");
                } else {
                    debug!(group = group.name(), "TTL cleanup: nothing expired");
                }
            }
        }
    })
}

/// Spawns a task that drops expired coalescer results each `interval`.
pub fn spawn_flight_sweeper(registry: GroupRegistry, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            for group in registry.groups() {
                let purged = group.purge_flight();
                if purged > 0 {
                    debug!(group = group.name(), purged, "purged coalesced results");
                }
            }
        }
    })
}

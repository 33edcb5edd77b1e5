//! TTL Reaper Task
//!
//! Background task that periodically removes expired cache entries.

use std::future::Future;
use std::sync::Weak;
use std::thread;
use std::time::Duration;

use tokio::runtime::Builder;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::cache::duration_millis;

/// Shortest period the reaper will tick at.
pub(crate) const MIN_REAP_INTERVAL: Duration = Duration::from_millis(1);

/// Longest period the reaper will tick at; keeps timer deadlines in range.
pub(crate) const MAX_REAP_INTERVAL: Duration = Duration::from_secs(60 * 60 * 24 * 365);

const REAPER_THREAD_NAME: &str = "ttlcache-reaper";

// == Sweep ==
/// Something the reaper can sweep for expired entries.
pub(crate) trait Sweep: Send + Sync + 'static {
    /// Removes expired entries and returns how many were removed.
    fn sweep(&self) -> usize;
}

/// Returns the sweep period for a cache with the given default TTL.
pub(crate) fn reap_interval(default_ttl: Duration) -> Duration {
    default_ttl.clamp(MIN_REAP_INTERVAL, MAX_REAP_INTERVAL)
}

// == Reaper Handle ==
/// Owner side of a running reaper.
///
/// Dropping the handle signals the reaper to stop before its next sweep.
#[derive(Debug)]
pub(crate) struct ReaperHandle {
    shutdown_tx: watch::Sender<bool>,
    interval: Duration,
}

impl ReaperHandle {
    /// Period between sweeps.
    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }

    /// Signals the reaper to stop. Idempotent.
    pub(crate) fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Returns true while the reaper task is still alive.
    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        !self.shutdown_tx.is_closed()
    }
}

impl Drop for ReaperHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawns a reaper that sweeps `target` every `interval`.
///
/// The reaper holds only a weak reference to its target and exits once the
/// target is dropped or the returned handle is shut down. It always runs on
/// its own thread driving a single-threaded runtime, so it outlives any
/// runtime the caller happens to be inside.
///
/// # Example
/// ```ignore
/// let sweeper = Arc::new(MySweeper::default());
/// let handle = spawn_reaper(Arc::downgrade(&sweeper), Duration::from_secs(1));
/// // Later:
/// handle.shutdown();
/// ```
pub(crate) fn spawn_reaper<S: Sweep>(target: Weak<S>, interval: Duration) -> ReaperHandle {
    let interval = reap_interval(interval);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    spawn_reaper_thread(run_reaper(target, interval, shutdown_rx));

    ReaperHandle {
        shutdown_tx,
        interval,
    }
}

fn spawn_reaper_thread<F>(task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let spawned = thread::Builder::new()
        .name(REAPER_THREAD_NAME.to_string())
        .spawn(move || match Builder::new_current_thread().enable_time().build() {
            Ok(runtime) => runtime.block_on(task),
            Err(err) => error!(error = %err, "Failed to build TTL reaper runtime"),
        });

    if let Err(err) = spawned {
        error!(error = %err, "Failed to spawn TTL reaper thread");
    }
}

async fn run_reaper<S: Sweep>(
    target: Weak<S>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!(
        interval_ms = duration_millis(interval),
        "Starting TTL reaper"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(target) = target.upgrade() else {
                    break;
                };
                let removed = target.sweep();
                drop(target);

                if removed > 0 {
                    info!(removed, "TTL reaper: removed expired entries");
                } else {
                    debug!("TTL reaper: no expired entries found");
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    info!("TTL reaper stopped");
}

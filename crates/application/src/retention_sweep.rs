use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::AuditLogger;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Periodic retention cleanup driven by the logger's [`crate::RetentionPolicy`].
pub struct RetentionSweep;

impl RetentionSweep {
    /// Starts sweeping on the current Tokio runtime.
    ///
    /// The first sweep runs one interval after start. The task stops when
    /// [`RetentionSweepHandle::stop`] is called or the handle is dropped.
    #[must_use]
    pub fn spawn(logger: AuditLogger) -> RetentionSweepHandle {
        let policy = logger.retention();
        let period = policy.cleanup_interval.max(MIN_SWEEP_INTERVAL);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                backend = logger.backend_name(),
                retention_days = policy.retention_days,
                interval_secs = period.as_secs(),
                "audit retention sweep started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // failures are reported by the logger; the next tick still runs
                        let _ = logger.cleanup_now().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            debug!("audit retention sweep stopped");
        });

        RetentionSweepHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Owner of a running retention sweep.
pub struct RetentionSweepHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RetentionSweepHandle {
    /// Returns whether the sweep task is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Signals the sweep to stop and waits for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

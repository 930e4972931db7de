//! Due-task scanner background loop.
//!
//! Ticks on a fixed period and asks the [`TaskManager`] to emit newly
//! overdue tasks onto a bounded channel. Tick failures are logged and the
//! loop keeps going; only a dropped receiver or cancellation ends it.

use super::manager::TaskManager;
use super::task::Task;
use crate::error::{Result, TrackerError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default interval between scans.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Default capacity of the outbound notification channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Create the bounded channel the scanner emits due tasks on.
#[must_use]
pub fn notification_channel(capacity: usize) -> (mpsc::Sender<Task>, mpsc::Receiver<Task>) {
    mpsc::channel(capacity.max(1))
}

/// Periodically scans for overdue tasks.
pub struct DueScanner {
    manager: Arc<TaskManager>,
    events: mpsc::Sender<Task>,
    cancel: CancellationToken,
    tick_interval: Duration,
}

impl DueScanner {
    /// Create a scanner that emits onto `events` until `cancel` fires.
    pub fn new(
        manager: Arc<TaskManager>,
        events: mpsc::Sender<Task>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            manager,
            events,
            cancel,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Override the tick period.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Run until cancelled.
    ///
    /// Returns `Ok(())` on cancellation and [`TrackerError::Channel`] when
    /// the receiving side of the channel has been dropped.
    pub async fn run(self) -> Result<()> {
        info!(
            interval_ms = u64::try_from(self.tick_interval.as_millis()).unwrap_or(u64::MAX),
            "due-task scanner started"
        );
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("due-task scanner stopped");
                    return Ok(());
                }
                _ = interval.tick() => {
                    match self.manager.scan_due(&self.events) {
                        Ok(report) => {
                            if report.emitted > 0 || report.deferred > 0 {
                                debug!(
                                    emitted = report.emitted,
                                    deferred = report.deferred,
                                    "scan tick finished"
                                );
                            }
                        }
                        Err(TrackerError::Channel(msg)) => {
                            warn!("due-task scanner stopping: {msg}");
                            return Err(TrackerError::Channel(msg));
                        }
                        Err(e) => warn!("scan tick failed: {e}"),
                    }
                }
            }
        }
    }

    /// Spawn [`run`](Self::run) onto the current tokio runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }
}

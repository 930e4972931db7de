//! Notification delivery for due tasks.
//!
//! The scanner only hands due tasks to a channel. Delivery lives here:
//! [`NotificationDispatcher`] drains that channel and fans each task out to
//! every registered [`Notifier`]. Delivery failures are logged and never
//! fed back into the task collection.

pub mod webhook;

use crate::tasks::Task;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use webhook::WebhookNotifier;

/// Notifier contract. New delivery mechanisms only need to implement this trait.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Stable notifier identifier (e.g. `log`, `webhook`).
    fn id(&self) -> &'static str;

    /// Deliver a notification for a due task.
    async fn notify(&self, task: &Task) -> anyhow::Result<()>;
}

/// Writes notifications to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn id(&self) -> &'static str {
        "log"
    }

    async fn notify(&self, task: &Task) -> anyhow::Result<()> {
        info!(id = %task.id, "{}", task.notification_message());
        Ok(())
    }
}

/// Consumes due tasks and delivers them to every notifier.
pub struct NotificationDispatcher {
    notifiers: Vec<Arc<dyn Notifier>>,
    cancel: CancellationToken,
}

impl NotificationDispatcher {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            notifiers: Vec::new(),
            cancel,
        }
    }

    /// Register a notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn notifier_ids(&self) -> Vec<&'static str> {
        self.notifiers.iter().map(|n| n.id()).collect()
    }

    /// Deliver one task to every notifier. Returns the number of failures.
    pub async fn dispatch(&self, task: &Task) -> usize {
        let mut failures = 0;
        for notifier in &self.notifiers {
            match notifier.notify(task).await {
                Ok(()) => debug!(notifier = notifier.id(), id = %task.id, "notification delivered"),
                Err(e) => {
                    failures += 1;
                    warn!(notifier = notifier.id(), id = %task.id, "notification failed: {e:#}");
                }
            }
        }
        failures
    }

    /// Drain `events` until the channel closes or the token is cancelled.
    pub async fn run(self, mut events: mpsc::Receiver<Task>) {
        info!(notifiers = ?self.notifier_ids(), "notification dispatcher started");
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("notification dispatcher cancelled");
                    break;
                }
                next = events.recv() => {
                    let Some(task) = next else {
                        info!("notification channel closed, dispatcher stopping");
                        break;
                    };
                    self.dispatch(&task).await;
                }
            }
        }
    }
}

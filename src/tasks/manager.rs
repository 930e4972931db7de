//! Concurrency-safe task collection.
//!
//! [`TaskManager`] owns the in-memory tasks behind a single mutex. Every
//! CRUD call and every scan tick holds that mutex for its whole critical
//! section, including the write to disk, so a caller that acquires the lock
//! later always observes state that has already been persisted.
//!
//! CRUD mutations are built on a copy of the collection and only swapped in
//! after the store accepted the new snapshot; a failed write leaves memory
//! exactly as it was.

use super::due;
use super::ids::{IdGenerator, UuidGenerator};
use super::store::TaskStore;
use super::task::{Task, TaskPatch, never_notified};
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, TrackerError};
use chrono::TimeDelta;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

/// Minimum time between two notifications for the same task (seconds).
pub const DEFAULT_COOLDOWN_SECS: i64 = 24 * 60 * 60;

struct TaskState {
    tasks: Vec<Task>,
    /// Scanner advanced `notified_at` but the batch write failed.
    dirty: bool,
}

/// Outcome of one scan over the collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Tasks handed to the outbound channel.
    pub emitted: usize,
    /// Due tasks left for the next tick because the channel was full.
    pub deferred: usize,
    /// Whether the collection was written to disk during this scan.
    pub persisted: bool,
}

/// Owns the task collection and serializes all access to it.
pub struct TaskManager {
    state: Mutex<TaskState>,
    store: TaskStore,
    clock: Arc<dyn Clock>,
    ids: Box<dyn IdGenerator>,
    cooldown: TimeDelta,
}

impl TaskManager {
    /// Load the collection from `store` and take ownership of it.
    ///
    /// Derived due instants are recomputed from the raw fields, so a
    /// hand-edited file schedules the same way as one written here. Records
    /// with malformed due fields, or with empty or duplicate ids, fail the
    /// load with [`TrackerError::Storage`].
    pub fn open(store: TaskStore) -> Result<Self> {
        let loaded = store.load()?;
        let mut tasks = Vec::with_capacity(loaded.len());
        let mut ids = HashSet::with_capacity(loaded.len());
        // A rewritten derived field is written back on the next scan.
        let mut dirty = false;
        for mut task in loaded {
            if task.id.is_empty() || !ids.insert(task.id.clone()) {
                return Err(TrackerError::Storage(format!(
                    "{} holds an empty or duplicate task id '{}'",
                    store.path().display(),
                    task.id
                )));
            }
            let raw = task.clone();
            due::normalize(&mut task).map_err(|e| {
                TrackerError::Storage(format!("task '{}' in {}: {e}", task.id, store.path().display()))
            })?;
            dirty |= task != raw;
            tasks.push(task);
        }
        info!(
            "loaded {} tasks from {}",
            tasks.len(),
            store.path().display()
        );
        Ok(Self {
            state: Mutex::new(TaskState { tasks, dirty }),
            store,
            clock: Arc::new(SystemClock),
            ids: Box::new(UuidGenerator),
            cooldown: TimeDelta::seconds(DEFAULT_COOLDOWN_SECS),
        })
    }

    /// Use a custom time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a custom identifier generator.
    #[must_use]
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Override the notification cooldown window.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: TimeDelta) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn cooldown(&self) -> TimeDelta {
        self.cooldown
    }

    // Mutations are applied by swapping in a complete collection, so the
    // data behind a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, TaskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist `next` and make it the live collection.
    fn commit(&self, state: &mut TaskState, next: Vec<Task>) -> Result<()> {
        self.store.save(&next)?;
        state.tasks = next;
        state.dirty = false;
        Ok(())
    }

    /// Add a new task and return the stored record.
    ///
    /// Any id on the input is replaced and `notified_at` starts unset.
    pub fn create(&self, mut task: Task) -> Result<Task> {
        let mut state = self.lock();

        let id = self.ids.generate()?;
        if id.is_empty() || state.tasks.iter().any(|t| t.id == id) {
            return Err(TrackerError::Generation(format!(
                "generated id '{id}' is empty or already in use"
            )));
        }
        task.id = id;
        task.notified_at = never_notified();
        due::normalize(&mut task)?;

        let mut next = state.tasks.clone();
        next.push(task.clone());
        self.commit(&mut state, next)?;

        debug!(id = %task.id, name = %task.name, "task created");
        Ok(task)
    }

    /// Snapshot of the collection in creation order.
    pub fn read(&self) -> Result<Vec<Task>> {
        Ok(self.lock().tasks.clone())
    }

    /// Merge `patch` over the task with the same id.
    ///
    /// Returns `false` without touching anything when no task matches.
    pub fn update(&self, patch: impl Into<TaskPatch>) -> Result<bool> {
        let patch = patch.into();
        let mut state = self.lock();

        let Some(index) = state.tasks.iter().position(|t| t.id == patch.id) else {
            debug!(id = %patch.id, "update skipped, no such task");
            return Ok(false);
        };

        let mut updated = state.tasks[index].clone();
        patch.apply_to(&mut updated);
        due::normalize(&mut updated)?;

        let mut next = state.tasks.clone();
        next[index] = updated;
        self.commit(&mut state, next)?;

        debug!(id = %patch.id, "task updated");
        Ok(true)
    }

    /// Remove the task with `id`. Returns `false` when no task matches.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut state = self.lock();

        let Some(index) = state.tasks.iter().position(|t| t.id == id) else {
            debug!(id, "delete skipped, no such task");
            return Ok(false);
        };

        let mut next = state.tasks.clone();
        next.remove(index);
        self.commit(&mut state, next)?;

        debug!(id, "task deleted");
        Ok(true)
    }

    /// Emit every open task that is overdue and outside its cooldown window.
    ///
    /// Emitted tasks get `notified_at = now`; the collection is written once
    /// at the end when anything changed. If that write fails the advances
    /// stay in memory (the notifications are already out) and the write is
    /// retried on the next scan. A closed channel is reported as
    /// [`TrackerError::Channel`] after persisting what was emitted.
    pub fn scan_due(&self, events: &mpsc::Sender<Task>) -> Result<ScanReport> {
        let mut state = self.lock();
        let now = self.clock.now();
        let mut report = ScanReport::default();
        let mut closed = false;

        for task in &mut state.tasks {
            let Some(due) = task.due_instant() else {
                continue;
            };
            if task.done || due > now || now - task.notified_at <= self.cooldown {
                continue;
            }

            match events.try_send(task.clone()) {
                Ok(()) => {
                    task.notified_at = now;
                    report.emitted += 1;
                }
                Err(TrySendError::Full(_)) => {
                    warn!(id = %task.id, "notification channel full, deferring task");
                    report.deferred += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    closed = true;
                    break;
                }
            }
        }

        if report.emitted > 0 {
            state.dirty = true;
        }
        if state.dirty {
            match self.store.save(&state.tasks) {
                Ok(()) => {
                    state.dirty = false;
                    report.persisted = true;
                }
                Err(e) => {
                    error!("cannot persist notified tasks, retrying next scan: {e}");
                    if !closed {
                        return Err(e);
                    }
                }
            }
        }

        if closed {
            return Err(TrackerError::Channel(
                "notification receiver dropped".to_owned(),
            ));
        }
        if report.emitted > 0 {
            debug!(emitted = report.emitted, "due tasks emitted");
        }
        Ok(report)
    }
}

//! Task records and update patches.

use super::due::is_blank;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wire format for local wall-clock instants (`2024-03-01 09:30:00`).
pub const INSTANT_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single trackable item with an optional due date/time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque unique identifier assigned on create.
    #[serde(default)]
    pub id: String,
    /// Free-form label.
    #[serde(default)]
    pub name: String,
    /// Completion flag. Done tasks are never notified.
    #[serde(default)]
    pub done: bool,
    /// Raw `YYYY-MM-DD` due date as supplied by the caller.
    #[serde(default)]
    pub due_date: Option<String>,
    /// The due date at local midnight.
    #[serde(default)]
    pub due_date_time: Option<NaiveDateTime>,
    /// Raw `HH:MM:SS` due clock as supplied by the caller.
    #[serde(default)]
    pub due_clock: Option<String>,
    /// The combined due instant: due date at the due clock (midnight if absent).
    #[serde(default)]
    pub due_clock_time: Option<NaiveDateTime>,
    /// Last notification time; the Unix epoch until the first notification.
    #[serde(default = "never_notified")]
    pub notified_at: NaiveDateTime,
}

/// Zero value of [`Task::notified_at`].
#[must_use]
pub fn never_notified() -> NaiveDateTime {
    DateTime::<Utc>::UNIX_EPOCH.naive_utc()
}

impl Task {
    /// Create an open task with no due date.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            done: false,
            due_date: None,
            due_date_time: None,
            due_clock: None,
            due_clock_time: None,
            notified_at: never_notified(),
        }
    }

    /// Set the raw due date.
    #[must_use]
    pub fn with_due_date(mut self, date: impl Into<String>) -> Self {
        self.due_date = Some(date.into());
        self
    }

    /// Set the raw due clock.
    #[must_use]
    pub fn with_due_clock(mut self, clock: impl Into<String>) -> Self {
        self.due_clock = Some(clock.into());
        self
    }

    /// The instant this task becomes overdue, if it has a due date.
    #[must_use]
    pub fn due_instant(&self) -> Option<NaiveDateTime> {
        self.due_clock_time
    }

    /// Whether a notification has ever been emitted for this task.
    #[must_use]
    pub fn was_notified(&self) -> bool {
        self.notified_at != never_notified()
    }

    /// Human-readable notification text.
    #[must_use]
    pub fn notification_message(&self) -> String {
        match self.due_instant() {
            Some(due) => format!(
                "Task due: {} (due {})",
                self.name,
                due.format(INSTANT_DISPLAY_FORMAT)
            ),
            None => format!("Task due: {}", self.name),
        }
    }
}

/// Sparse update for an existing task.
///
/// Only the fields that are `Some` overwrite the stored record. Derived
/// fields and `notified_at` are never patched directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub due_clock: Option<String>,
}

impl TaskPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn done(mut self, done: bool) -> Self {
        self.done = Some(done);
        self
    }

    #[must_use]
    pub fn due_date(mut self, date: impl Into<String>) -> Self {
        self.due_date = Some(date.into());
        self
    }

    #[must_use]
    pub fn due_clock(mut self, clock: impl Into<String>) -> Self {
        self.due_clock = Some(clock.into());
        self
    }

    /// Apply the present fields onto `task`. Does not re-normalize.
    ///
    /// Blank due strings count as absent, so a patch never clears a due
    /// date or clock.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name.clone_from(name);
        }
        if let Some(done) = self.done {
            task.done = done;
        }
        if let Some(date) = self.due_date.as_deref().filter(|d| !is_blank(d)) {
            task.due_date = Some(date.to_owned());
        }
        if let Some(clock) = self.due_clock.as_deref().filter(|c| !is_blank(c)) {
            task.due_clock = Some(clock.to_owned());
        }
    }
}

/// Keeps only the non-empty / non-zero fields of a full record.
impl From<Task> for TaskPatch {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            name: Some(task.name).filter(|n| !n.is_empty()),
            done: task.done.then_some(true),
            due_date: task.due_date.filter(|d| !is_blank(d)),
            due_clock: task.due_clock.filter(|c| !is_blank(c)),
        }
    }
}

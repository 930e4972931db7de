//! Taskbell: a small task tracker with due-date reminders.
//!
//! Tasks live in a single JSON file. A background scanner checks them on a
//! fixed tick and hands overdue tasks to a notification channel, at most
//! once per cooldown window.
//!
//! # Architecture
//!
//! - **Tasks**: the record type, due-date normalization and file store
//! - **Manager**: lock-guarded CRUD and the per-tick due scan
//! - **Scanner**: the periodic loop that drives the scan
//! - **Notify**: delivers emitted tasks to log and webhook notifiers
//! - **Server**: JSON over HTTP for the CRUD operations

pub mod clock;
pub mod config;
pub mod error;
pub mod notify;
pub mod paths;
pub mod server;
pub mod tasks;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TrackerConfig;
pub use error::{Result, TrackerError};
pub use notify::{LogNotifier, NotificationDispatcher, Notifier, WebhookNotifier};
pub use server::TaskServer;
pub use tasks::{DueScanner, ScanReport, Task, TaskManager, TaskPatch, TaskStore};

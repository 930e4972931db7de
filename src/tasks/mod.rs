//! Task tracking core.
//!
//! - [`task`]: the task record and sparse update patches
//! - [`due`]: due date/clock parsing and normalization
//! - [`store`]: JSON file persistence
//! - [`manager`]: lock-guarded CRUD plus the per-tick due scan
//! - [`scanner`]: the periodic background loop driving the scan

pub mod due;
pub mod ids;
pub mod manager;
pub mod scanner;
pub mod store;
pub mod task;

pub use ids::{IdGenerator, UuidGenerator};
pub use manager::{ScanReport, TaskManager};
pub use scanner::{DueScanner, notification_channel};
pub use store::TaskStore;
pub use task::{Task, TaskPatch};

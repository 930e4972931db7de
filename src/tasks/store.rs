//! Flat-file persistence for the task collection.
//!
//! The whole ordered collection is written as a pretty-printed JSON array.
//! Writes land in a sibling temp file which is then renamed over the
//! target, so readers see either the previous or the new snapshot.

use super::task::Task;
use crate::error::{Result, TrackerError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// JSON file holding every task.
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default data location (`data_dir()/tasks.json`).
    #[must_use]
    pub fn at_default_path() -> Self {
        Self::new(crate::paths::tasks_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the collection. A missing or blank file is an empty collection.
    pub fn load(&self) -> Result<Vec<Task>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no task file at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(TrackerError::Storage(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            TrackerError::Storage(format!("cannot parse {}: {e}", self.path.display()))
        })
    }

    /// Replace the file content with `tasks`.
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| TrackerError::Storage(format!("cannot create task dir: {e}")))?;
        }

        let json = serde_json::to_string_pretty(tasks)
            .map_err(|e| TrackerError::Storage(format!("cannot serialize tasks: {e}")))?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)
            .map_err(|e| TrackerError::Storage(format!("cannot write task temp file: {e}")))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp_path);
            TrackerError::Storage(format!("cannot finalize {}: {e}", self.path.display()))
        })?;

        debug!("saved {} tasks to {}", tasks.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::tasks::due;
    use chrono::NaiveDate;

    fn sample_tasks() -> Vec<Task> {
        let mut first = Task::new("Pay rent")
            .with_due_date("2024-03-01")
            .with_due_clock("09:30:00");
        first.id = "a".to_owned();
        due::normalize(&mut first).unwrap();
        first.notified_at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 1)
            .unwrap();

        let mut second = Task::new("Read a book");
        second.id = "b".to_owned();
        second.done = true;

        vec![first, second]
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::new(dir.path().join("nope.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn blank_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "").unwrap();
        assert!(TaskStore::new(&path).load().unwrap().is_empty());

        std::fs::write(&path, "  \n").unwrap();
        assert!(TaskStore::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::new(dir.path().join("nested").join("tasks.json"));
        let tasks = sample_tasks();

        store.save(&tasks).unwrap();
        let restored = store.load().unwrap();

        assert_eq!(restored, tasks);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn save_replaces_prior_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::new(dir.path().join("tasks.json"));
        store.save(&sample_tasks()).unwrap();
        store.save(&[]).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn file_is_a_readable_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::new(dir.path().join("tasks.json"));
        store.save(&sample_tasks()).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains('\n'), "expected pretty output: {text}");
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let array = value.as_array().expect("top-level array");
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["due_clock_time"], "2024-03-01T09:30:00");
        assert_eq!(array[1]["notified_at"], "1970-01-01T00:00:00");
    }

    #[test]
    fn malformed_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            TaskStore::new(&path).load(),
            Err(TrackerError::Storage(_))
        ));
    }

    #[test]
    fn unwritable_location_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let store = TaskStore::new(blocker.join("tasks.json"));
        assert!(matches!(store.save(&[]), Err(TrackerError::Storage(_))));
    }
}

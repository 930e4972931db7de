//! Where taskbell keeps its files.
//!
//! The task collection (`tasks.json`) lives in the data directory and the
//! daemon settings (`config.toml`) in the config directory. Both resolve
//! through [`dirs`] and can be moved with `TASKBELL_DATA_DIR` and
//! `TASKBELL_CONFIG_DIR`; `[store] path` in the config overrides the task
//! file location on its own.

use std::path::PathBuf;

/// Directory holding the task collection.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("TASKBELL_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("taskbell"))
        .unwrap_or_else(|| PathBuf::from("/tmp/taskbell-data"))
}

/// Directory holding `config.toml`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("TASKBELL_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("taskbell"))
        .unwrap_or_else(|| PathBuf::from("/tmp/taskbell-config"))
}

/// Daemon settings read at startup.
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Default task file when `[store] path` is unset.
#[must_use]
pub fn tasks_file() -> PathBuf {
    data_dir().join("tasks.json")
}

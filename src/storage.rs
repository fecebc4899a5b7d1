//! Storage layer for tamo
//!
//! The whole store lives in one JSON file:
//!
//! ```text
//! .tamo/                # data directory (configurable)
//!   data.json           # {"version": 1, "tasks": [...], "memos": [...]}
//! ```
//!
//! Saves go through a temp file in the same directory followed by a rename,
//! so a crash mid-write leaves the previous file intact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::model::Store;

/// Storage manager for the tamo data file
#[derive(Debug, Clone)]
pub struct Storage {
    /// Directory holding the data file
    dir: PathBuf,
    /// Data file name inside `dir`
    file: String,
}

impl Storage {
    pub fn new(dir: impl Into<PathBuf>, file: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file: file.into(),
        }
    }

    /// Storage rooted at `base` as described by the `[storage]` config section.
    ///
    /// `dir_override` replaces the configured directory (relative paths are
    /// taken from `base`).
    pub fn from_config(base: &Path, config: &StorageConfig, dir_override: Option<&Path>) -> Self {
        let dir = dir_override.unwrap_or(&config.dir);
        Self::new(base.join(dir), config.file.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path to the data file
    pub fn data_file(&self) -> PathBuf {
        self.dir.join(&self.file)
    }

    pub fn is_initialized(&self) -> bool {
        self.data_file().is_file()
    }

    /// Create the data directory and an empty store.
    ///
    /// Returns `false` when the data file already existed; it is left as is.
    pub fn init(&self) -> Result<bool> {
        fs::create_dir_all(&self.dir)?;
        if self.is_initialized() {
            debug!(path = %self.data_file().display(), "storage already initialized");
            return Ok(false);
        }
        self.save(&Store::new())?;
        info!(path = %self.data_file().display(), "initialized storage");
        Ok(true)
    }

    /// Load the store; fails with `NotInitialized` when there is no data file.
    pub fn load(&self) -> Result<Store> {
        let path = self.data_file();
        if !path.is_file() {
            return Err(Error::NotInitialized(path));
        }
        let store: Store = self.read_json(&path)?;
        debug!(
            path = %path.display(),
            tasks = store.tasks.len(),
            memos = store.memos.len(),
            "loaded store"
        );
        Ok(store)
    }

    pub fn save(&self, store: &Store) -> Result<()> {
        let path = self.data_file();
        self.write_json(&path, store)?;
        debug!(
            path = %path.display(),
            tasks = store.tasks.len(),
            memos = store.memos.len(),
            "saved store"
        );
        Ok(())
    }

    /// Write JSON data to a file atomically
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let mut json = serde_json::to_string_pretty(data)?;
        json.push('\n');
        self.write_atomic(path, json.as_bytes())
    }

    /// Read JSON data from a file
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Write data atomically using temp file + rename
    pub fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(data)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|err| Error::Io(err.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Memo, Task};
    use tempfile::TempDir;

    fn storage_in(temp: &TempDir) -> Storage {
        Storage::new(temp.path().join(".tamo"), "data.json")
    }

    #[test]
    fn paths_follow_config() {
        let temp = TempDir::new().expect("tempdir");
        let config = StorageConfig::default();
        let storage = Storage::from_config(temp.path(), &config, None);
        assert_eq!(storage.data_file(), temp.path().join(".tamo/data.json"));

        let storage = Storage::from_config(temp.path(), &config, Some(Path::new("elsewhere")));
        assert_eq!(storage.data_file(), temp.path().join("elsewhere/data.json"));
    }

    #[test]
    fn init_creates_empty_store_once() {
        let temp = TempDir::new().expect("tempdir");
        let storage = storage_in(&temp);
        assert!(!storage.is_initialized());

        assert!(storage.init().expect("init"));
        assert!(storage.is_initialized());
        let raw = fs::read_to_string(storage.data_file()).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["version"], 1);
        assert_eq!(value["tasks"], serde_json::json!([]));
        assert_eq!(value["memos"], serde_json::json!([]));

        assert!(!storage.init().expect("re-init"));
    }

    #[test]
    fn load_without_init_is_not_initialized() {
        let temp = TempDir::new().expect("tempdir");
        let err = storage_in(&temp).load().expect_err("missing");
        assert!(matches!(err, Error::NotInitialized(_)));
    }

    #[test]
    fn save_then_load_preserves_store() {
        let temp = TempDir::new().expect("tempdir");
        let storage = storage_in(&temp);
        storage.init().expect("init");

        let mut store = storage.load().expect("load");
        let memo = Memo::new(Some("Notes".to_string()), "body");
        let mut task = Task::new("Write", "desc", vec![memo.id.clone()]).expect("task");
        task.order = 1.5;
        store.commit(task, vec![memo]).expect("commit");
        storage.save(&store).expect("save");

        let loaded = storage.load().expect("reload");
        assert_eq!(loaded.tasks.len(), 1);
        assert_eq!(loaded.tasks[0].order, 1.5);
        assert_eq!(loaded.memos[0].title.as_deref(), Some("Notes"));
        assert_eq!(loaded.tasks[0].memo_refs, vec![loaded.memos[0].id.clone()]);
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let temp = TempDir::new().expect("tempdir");
        let storage = storage_in(&temp);
        storage.init().expect("init");
        storage.save(&Store::new()).expect("save");

        let entries: Vec<_> = fs::read_dir(storage.dir())
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("data.json")]);
    }

    #[test]
    fn corrupt_file_is_json_error() {
        let temp = TempDir::new().expect("tempdir");
        let storage = storage_in(&temp);
        fs::create_dir_all(storage.dir()).expect("mkdir");
        fs::write(storage.data_file(), "{ not json").expect("write");
        assert!(matches!(storage.load(), Err(Error::Json(_))));
    }
}

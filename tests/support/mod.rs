#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// `tamo` binary with an environment that ignores the caller's settings
pub fn tamo_cmd() -> Command {
    let mut cmd = Command::cargo_bin("tamo").expect("tamo binary");
    cmd.env_remove("TAMO_DIR")
        .env_remove("RUST_LOG")
        .env_remove("VISUAL")
        .env_remove("EDITOR");
    cmd
}

/// Scratch working directory for one test
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    /// Fresh directory with `tamo init` already run
    pub fn initialized() -> Result<Self, Box<dyn std::error::Error>> {
        let dir = Self::new();
        dir.cmd().arg("init").assert().success();
        Ok(dir)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = tamo_cmd();
        cmd.current_dir(self.path());
        cmd
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn data_file(&self) -> PathBuf {
        self.path().join(".tamo").join("data.json")
    }

    /// Parsed contents of the default data file
    pub fn store(&self) -> Result<Value, Box<dyn std::error::Error>> {
        let raw = fs::read_to_string(self.data_file())?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Run a command with `--json`, require success, and return `data`.
    pub fn json(&self, args: &[&str]) -> Result<Value, Box<dyn std::error::Error>> {
        let output = self.cmd().arg("--json").args(args).assert().success();
        let stdout = String::from_utf8(output.get_output().stdout.clone())?;
        let envelope: Value = serde_json::from_str(&stdout)?;
        assert_eq!(envelope["status"], "success", "{stdout}");
        Ok(envelope["data"].clone())
    }

    /// Add a task by title and return its id
    pub fn add_task(&self, title: &str) -> Result<String, Box<dyn std::error::Error>> {
        let data = self.json(&["add", "task", title])?;
        Ok(string_field(&data["task"], "id"))
    }

    /// Add a memo with inline content and return its id
    pub fn add_memo(&self, title: &str, content: &str) -> Result<String, Box<dyn std::error::Error>> {
        let data = self.json(&["add", "memo", title, "-c", content])?;
        Ok(string_field(&data, "id"))
    }

    /// Task titles in listing order
    pub fn task_titles(&self) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let data = self.json(&["list"])?;
        Ok(data["tasks"]
            .as_array()
            .map(|tasks| tasks.iter().map(|task| string_field(task, "title")).collect())
            .unwrap_or_default())
    }

    /// Find a task in the data file by id
    pub fn stored_task(&self, id: &str) -> Result<Value, Box<dyn std::error::Error>> {
        let store = self.store()?;
        let task = store["tasks"]
            .as_array()
            .and_then(|tasks| tasks.iter().find(|task| task["id"] == id))
            .cloned()
            .ok_or_else(|| format!("task {id} not in store"))?;
        Ok(task)
    }
}

pub fn string_field(value: &Value, key: &str) -> String {
    value[key].as_str().unwrap_or_default().to_string()
}

/// Write a data file with fixed ids so prefix behaviour is deterministic.
pub fn write_fixture_store(dir: &TestDir) -> std::io::Result<PathBuf> {
    dir.write_file(
        ".tamo/data.json",
        r#"{
  "version": 1,
  "tasks": [
    {
      "id": "11111111-aaaa-4aaa-8aaa-aaaaaaaaaaaa",
      "title": "Write report",
      "description": "see [memo](aaaa0001-0000-4000-8000-000000000001)",
      "order": 1.0,
      "done": false,
      "memo_refs": ["aaaa0001-0000-4000-8000-000000000001"],
      "created_at": "2024-03-01T09:00:00Z",
      "updated_at": "2024-03-01T09:00:00Z"
    },
    {
      "id": "11112222-bbbb-4bbb-8bbb-bbbbbbbbbbbb",
      "title": "Review draft",
      "description": "",
      "order": 2.0,
      "done": true,
      "memo_refs": null,
      "created_at": "2024-03-01T09:05:00Z",
      "updated_at": "2024-03-01T09:05:00Z"
    }
  ],
  "memos": [
    {
      "id": "aaaa0001-0000-4000-8000-000000000001",
      "title": "Outline",
      "content": "intro, body, end",
      "created_at": "2024-03-01T08:00:00Z",
      "updated_at": "2024-03-01T08:00:00Z"
    },
    {
      "id": "aaaa0002-0000-4000-8000-000000000002",
      "title": null,
      "content": "loose note",
      "created_at": "2024-03-01T08:30:00Z",
      "updated_at": "2024-03-01T08:30:00Z"
    }
  ]
}
"#,
    )
}

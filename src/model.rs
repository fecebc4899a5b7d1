//! Task and memo records and the store that holds them.
//!
//! The store is a plain value: callers load it, mutate it through the
//! methods here (and in `ordering` / `integrity` / `ingest`), and save it
//! back as a whole. Every mutator refreshes `updated_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{EntityKind, Error, Result, TaskSummary};

/// Schema version written to the data file
pub const STORE_VERSION: u32 = 1;

/// Generate a fresh record identifier
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Leading `len` characters of an id, for display
pub fn short_id(id: &str, len: usize) -> &str {
    match id.char_indices().nth(len) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// RFC 3339 timestamps at second precision with a `Z` suffix.
pub(crate) mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument("title cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub order: f64,
    #[serde(default)]
    pub done: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub memo_refs: Vec<String>,
    #[serde(with = "timestamp", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp", default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// New undone task with a fresh id; `order` is assigned by the caller.
    pub fn new(
        title: &str,
        description: impl Into<String>,
        memo_refs: Vec<String>,
    ) -> Result<Self> {
        let title = validate_title(title)?;
        let now = Utc::now();
        Ok(Self {
            id: new_id(),
            title,
            description: description.into(),
            order: 0.0,
            done: false,
            memo_refs,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            title: self.title.clone(),
        }
    }

    pub fn references(&self, memo_id: &str) -> bool {
        self.memo_refs.iter().any(|id| id == memo_id)
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.title = validate_title(title)?;
        self.touch();
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.touch();
    }

    pub fn set_order(&mut self, order: f64) {
        self.order = order;
        self.touch();
    }

    pub fn set_done(&mut self, done: bool) {
        self.done = done;
        self.touch();
    }

    pub fn set_memo_refs(&mut self, memo_refs: Vec<String>) {
        self.memo_refs = memo_refs;
        self.touch();
    }

    /// Drop every occurrence of `memo_id`; returns whether anything changed.
    pub fn prune_memo_ref(&mut self, memo_id: &str) -> bool {
        let before = self.memo_refs.len();
        self.memo_refs.retain(|id| id != memo_id);
        let changed = self.memo_refs.len() != before;
        if changed {
            self.touch();
        }
        changed
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(with = "timestamp", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp", default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Memo {
    pub fn new(title: Option<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            title,
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Title for display, `<no title>` when absent
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("<no title>")
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
        self.touch();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// The full data set: every task and memo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub version: u32,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub memos: Vec<Memo>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            version: STORE_VERSION,
            tasks: Vec::new(),
            memos: Vec::new(),
        }
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    pub fn memo(&self, id: &str) -> Option<&Memo> {
        self.memos.iter().find(|memo| memo.id == id)
    }

    pub fn memo_mut(&mut self, id: &str) -> Option<&mut Memo> {
        self.memos.iter_mut().find(|memo| memo.id == id)
    }

    /// Like `task_mut`, failing with `NotFound`.
    pub fn require_task_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.task_mut(id)
            .ok_or_else(|| Error::not_found(EntityKind::Task, id))
    }

    /// Like `memo_mut`, failing with `NotFound`.
    pub fn require_memo_mut(&mut self, id: &str) -> Result<&mut Memo> {
        self.memo_mut(id)
            .ok_or_else(|| Error::not_found(EntityKind::Memo, id))
    }

    pub fn add_task(&mut self, task: Task) -> Result<()> {
        self.ensure_unused_id(&task.id)?;
        self.tasks.push(task);
        Ok(())
    }

    pub fn add_memo(&mut self, memo: Memo) -> Result<()> {
        self.ensure_unused_id(&memo.id)?;
        self.memos.push(memo);
        Ok(())
    }

    /// Add a task together with the memos it was built from.
    ///
    /// Ids are checked up front so a failure leaves the store untouched.
    pub fn commit(&mut self, task: Task, memos: Vec<Memo>) -> Result<()> {
        let mut incoming: Vec<&str> = Vec::with_capacity(memos.len() + 1);
        incoming.push(&task.id);
        incoming.extend(memos.iter().map(|memo| memo.id.as_str()));
        for (idx, id) in incoming.iter().enumerate() {
            self.ensure_unused_id(id)?;
            if incoming[..idx].contains(id) {
                return Err(Error::InvalidArgument(format!("duplicate id in commit: {id}")));
            }
        }
        self.memos.extend(memos);
        self.tasks.push(task);
        Ok(())
    }

    /// Tasks in canonical order: ascending `order`, ties in store order.
    pub fn sorted_tasks(&self) -> Vec<&Task> {
        crate::ordering::sorted(&self.tasks)
    }

    pub fn first_task(&self) -> Option<&Task> {
        self.sorted_tasks().into_iter().next()
    }

    pub fn last_task(&self) -> Option<&Task> {
        self.sorted_tasks().into_iter().last()
    }

    /// Lowest-ordered task that is not done
    pub fn next_undone(&self) -> Option<&Task> {
        self.sorted_tasks().into_iter().find(|task| !task.done)
    }

    pub fn tasks_referencing(&self, memo_id: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.references(memo_id))
            .collect()
    }

    fn ensure_unused_id(&self, id: &str) -> Result<()> {
        if self.task(id).is_some() || self.memo(id).is_some() {
            return Err(Error::InvalidArgument(format!("id already in use: {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_with_order(title: &str, order: f64) -> Task {
        let mut task = Task::new(title, "", Vec::new()).expect("task");
        task.order = order;
        task
    }

    #[test]
    fn new_task_is_undone_with_fresh_id() {
        let task = Task::new("Write report", "draft", vec!["m1".to_string()]).expect("task");
        assert_eq!(task.title, "Write report");
        assert_eq!(task.description, "draft");
        assert_eq!(task.memo_refs, vec!["m1".to_string()]);
        assert!(!task.done);
        assert_eq!(task.id.len(), 36);
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn blank_title_rejected() {
        let err = Task::new("   ", "", Vec::new()).expect_err("blank");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn mutation_refreshes_updated_at_only() {
        let mut task = Task::new("A", "", Vec::new()).expect("task");
        let created = task.created_at - chrono::Duration::seconds(10);
        task.created_at = created;
        task.updated_at = created;

        task.set_done(true);
        assert!(task.done);
        assert_eq!(task.created_at, created);
        assert!(task.updated_at > created);
    }

    #[test]
    fn prune_removes_every_occurrence() {
        let mut task = Task::new(
            "A",
            "",
            vec!["m1".to_string(), "m2".to_string(), "m1".to_string()],
        )
        .expect("task");
        assert!(task.prune_memo_ref("m1"));
        assert_eq!(task.memo_refs, vec!["m2".to_string()]);
        assert!(!task.prune_memo_ref("m1"));
    }

    #[test]
    fn memo_title_absent_is_not_empty_string() {
        let memo = Memo::new(None, "body");
        let json = serde_json::to_value(&memo).expect("json");
        assert!(json.get("title").is_none());
        assert_eq!(memo.display_title(), "<no title>");

        let titled = Memo::new(Some(String::new()), "body");
        let json = serde_json::to_value(&titled).expect("json");
        assert_eq!(json["title"], serde_json::Value::String(String::new()));
    }

    #[test]
    fn deserializes_null_title_and_null_refs() {
        let raw = r#"{
            "version": 1,
            "tasks": [{
                "id": "t1", "title": "T", "description": "", "order": 1.5,
                "done": false, "memo_refs": null,
                "created_at": "2024-05-01T10:00:00Z",
                "updated_at": "2024-05-01T10:00:00+02:00"
            }],
            "memos": [{
                "id": "m1", "title": null, "content": "c",
                "created_at": "2024-05-01T10:00:00Z",
                "updated_at": "2024-05-01T10:00:00Z"
            }]
        }"#;
        let store: Store = serde_json::from_str(raw).expect("parse");
        assert!(store.tasks[0].memo_refs.is_empty());
        assert_eq!(store.memos[0].title, None);
        assert_eq!(
            store.tasks[0].updated_at.to_rfc3339(),
            "2024-05-01T08:00:00+00:00"
        );
    }

    #[test]
    fn timestamps_serialize_at_second_precision() {
        let mut memo = Memo::new(None, "");
        memo.created_at = DateTime::parse_from_rfc3339("2024-05-01T10:00:00.987Z")
            .expect("ts")
            .with_timezone(&Utc);
        let json = serde_json::to_value(&memo).expect("json");
        assert_eq!(json["created_at"], "2024-05-01T10:00:00Z");
    }

    #[test]
    fn missing_timestamps_are_filled() {
        let raw = r#"{"id": "m1", "content": "x"}"#;
        let memo: Memo = serde_json::from_str(raw).expect("parse");
        assert!(memo.created_at <= Utc::now());
    }

    #[test]
    fn first_last_and_next_undone() {
        let mut store = Store::new();
        let mut a = task_with_order("A", 2.0);
        a.done = true;
        let b = task_with_order("B", 1.0);
        let c = task_with_order("C", 3.0);
        let mut b_done = b.clone();
        b_done.done = true;
        store.add_task(a).expect("a");
        store.add_task(b_done).expect("b");
        store.add_task(c).expect("c");

        assert_eq!(store.first_task().map(|t| t.title.as_str()), Some("B"));
        assert_eq!(store.last_task().map(|t| t.title.as_str()), Some("C"));
        assert_eq!(store.next_undone().map(|t| t.title.as_str()), Some("C"));
    }

    #[test]
    fn commit_rejects_id_collision_without_partial_insert() {
        let mut store = Store::new();
        let existing = Memo::new(None, "old");
        store.add_memo(existing.clone()).expect("memo");

        let task = Task::new("T", "", vec![existing.id.clone()]).expect("task");
        let err = store
            .commit(task, vec![Memo::new(None, "new"), existing])
            .expect_err("collision");
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(store.tasks.is_empty());
        assert_eq!(store.memos.len(), 1);
    }

    #[test]
    fn short_id_truncates() {
        assert_eq!(short_id("0123456789", 4), "0123");
        assert_eq!(short_id("012", 8), "012");
    }
}

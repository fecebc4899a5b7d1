//! Render a task as a single Markdown document with its memos inlined.

use std::fmt::Write;

use crate::error::{EntityKind, Error, Result};
use crate::model::{short_id, Store, Task};

/// Flattened Markdown for the task with id `task_id`.
pub fn flatten_task(store: &Store, task_id: &str, short_id_len: usize) -> Result<String> {
    let task = store
        .task(task_id)
        .ok_or_else(|| Error::not_found(EntityKind::Task, task_id))?;
    Ok(render_task(store, task, short_id_len))
}

/// Flattened Markdown for `task`; memo references expand in `memo_refs` order.
pub fn render_task(store: &Store, task: &Task, short_id_len: usize) -> String {
    let mut doc = String::new();

    let _ = write!(doc, "# {}\n\n", task.title);
    let status = if task.done { "Completed" } else { "Not completed" };
    let _ = write!(doc, "**Status:** {status}\n\n");

    if !task.description.is_empty() {
        doc.push_str("## Description\n\n");
        doc.push_str(&task.description);
        doc.push_str("\n\n");
    }

    if !task.memo_refs.is_empty() {
        doc.push_str("## Referenced Memos\n\n");
        for memo_id in &task.memo_refs {
            let short = short_id(memo_id, short_id_len);
            match store.memo(memo_id) {
                Some(memo) => {
                    match memo.title.as_deref() {
                        Some(title) => {
                            let _ = write!(doc, "### {title}\n\n");
                        }
                        None => {
                            let _ = write!(doc, "### Memo {short}\n\n");
                        }
                    }
                    doc.push_str(&memo.content);
                    doc.push_str("\n\n");
                }
                None => {
                    let _ = write!(doc, "### Memo {short} (not found)\n\n");
                }
            }
        }
    }

    doc.truncate(doc.trim_end().len());
    doc.push('\n');
    doc
}

//! Identifier resolution and memo reference integrity.

use tracing::{debug, info};

use crate::error::{EntityKind, Error, Result, TaskSummary};
use crate::model::{Memo, Store, Task};

/// A resolved identifier from a lookup that accepts either kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Task(String),
    Memo(String),
}

/// Result of a successful memo removal
#[derive(Debug, Clone)]
pub struct RemovedMemo {
    pub memo: Memo,
    /// Tasks that lost a reference to the memo
    pub pruned: Vec<TaskSummary>,
}

enum PrefixMatch {
    One(String),
    None,
    Many(Vec<String>),
}

fn match_prefix<'a>(ids: impl Iterator<Item = &'a str>, input: &str) -> PrefixMatch {
    let mut matches: Vec<String> = Vec::new();
    for id in ids {
        if id == input {
            return PrefixMatch::One(id.to_string());
        }
        if id.starts_with(input) {
            matches.push(id.to_string());
        }
    }
    match matches.len() {
        0 => PrefixMatch::None,
        1 => PrefixMatch::One(matches.remove(0)),
        _ => {
            matches.sort();
            matches.dedup();
            PrefixMatch::Many(matches)
        }
    }
}

fn normalize_input(input: &str, kind: EntityKind) -> Result<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument(format!("{kind} id cannot be empty")));
    }
    Ok(trimmed)
}

/// Resolve `input` against `ids`: an exact id wins, otherwise a unique prefix.
pub fn resolve_prefix<'a>(
    ids: impl Iterator<Item = &'a str>,
    input: &str,
    kind: EntityKind,
) -> Result<String> {
    let input = normalize_input(input, kind)?;
    match match_prefix(ids, input) {
        PrefixMatch::One(id) => Ok(id),
        PrefixMatch::None => Err(Error::not_found(kind, input)),
        PrefixMatch::Many(candidates) => Err(Error::AmbiguousReference {
            kind,
            input: input.to_string(),
            candidates,
        }),
    }
}

pub fn resolve_task_id(store: &Store, input: &str) -> Result<String> {
    resolve_prefix(
        store.tasks.iter().map(|task| task.id.as_str()),
        input,
        EntityKind::Task,
    )
}

pub fn resolve_memo_id(store: &Store, input: &str) -> Result<String> {
    resolve_prefix(
        store.memos.iter().map(|memo| memo.id.as_str()),
        input,
        EntityKind::Memo,
    )
}

/// Resolve an id that may name a task or a memo; tasks are tried first.
pub fn resolve_entity(store: &Store, input: &str) -> Result<EntityRef> {
    let input = normalize_input(input, EntityKind::TaskOrMemo)?;
    match match_prefix(store.tasks.iter().map(|task| task.id.as_str()), input) {
        PrefixMatch::One(id) => return Ok(EntityRef::Task(id)),
        PrefixMatch::Many(candidates) => {
            return Err(Error::AmbiguousReference {
                kind: EntityKind::Task,
                input: input.to_string(),
                candidates,
            })
        }
        PrefixMatch::None => {}
    }
    match match_prefix(store.memos.iter().map(|memo| memo.id.as_str()), input) {
        PrefixMatch::One(id) => Ok(EntityRef::Memo(id)),
        PrefixMatch::Many(candidates) => Err(Error::AmbiguousReference {
            kind: EntityKind::Memo,
            input: input.to_string(),
            candidates,
        }),
        PrefixMatch::None => Err(Error::not_found(EntityKind::TaskOrMemo, input)),
    }
}

/// Resolve a list of memo references supplied by the user.
///
/// Blank entries are skipped and repeats collapse to their first occurrence.
pub fn resolve_memo_refs<S: AsRef<str>>(store: &Store, inputs: &[S]) -> Result<Vec<String>> {
    let mut resolved: Vec<String> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let input = input.as_ref();
        if input.trim().is_empty() {
            continue;
        }
        let id = resolve_memo_id(store, input)?;
        if !resolved.contains(&id) {
            resolved.push(id);
        }
    }
    Ok(resolved)
}

/// Remove a memo.
///
/// Without `force`, a memo still referenced by any task is left in place and
/// the referencing tasks are reported. With `force`, every reference to it is
/// pruned from every task along with the memo itself.
pub fn remove_memo(store: &mut Store, memo_id: &str, force: bool) -> Result<RemovedMemo> {
    let idx = store
        .memos
        .iter()
        .position(|memo| memo.id == memo_id)
        .ok_or_else(|| Error::not_found(EntityKind::Memo, memo_id))?;

    let referencing: Vec<TaskSummary> = store
        .tasks_referencing(memo_id)
        .into_iter()
        .map(Task::summary)
        .collect();

    if !referencing.is_empty() && !force {
        return Err(Error::ReferentialConflict {
            memo_id: memo_id.to_string(),
            tasks: referencing,
        });
    }

    for task in store.tasks.iter_mut() {
        task.prune_memo_ref(memo_id);
    }
    let memo = store.memos.remove(idx);
    if referencing.is_empty() {
        debug!(memo = memo_id, "removed memo");
    } else {
        info!(memo = memo_id, pruned = referencing.len(), "removed referenced memo");
    }
    Ok(RemovedMemo {
        memo,
        pruned: referencing,
    })
}

/// Remove a task; memos it referenced are left alone.
pub fn remove_task(store: &mut Store, task_id: &str) -> Result<Task> {
    let idx = store
        .tasks
        .iter()
        .position(|task| task.id == task_id)
        .ok_or_else(|| Error::not_found(EntityKind::Task, task_id))?;
    debug!(task = task_id, "removed task");
    Ok(store.tasks.remove(idx))
}

/// References held by `task` that no longer resolve to a memo
pub fn dangling_refs<'a>(store: &Store, task: &'a Task) -> Vec<&'a str> {
    task.memo_refs
        .iter()
        .filter(|id| store.memo(id).is_none())
        .map(String::as_str)
        .collect()
}

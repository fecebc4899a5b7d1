//! Commands that accept either a task or a memo: list, show, rm, edit.

use serde::Serialize;
use tracing::info;

use crate::editor::{
    parse_memo_document, parse_task_document, render_memo_document, render_task_document,
};
use crate::error::{EntityKind, Error, Result, TaskSummary};
use crate::integrity::{
    dangling_refs, remove_memo, remove_task, resolve_entity, resolve_memo_id, resolve_memo_refs,
    EntityRef,
};
use crate::model::{Memo, Store, Task};
use crate::output::{emit_success, HumanOutput};

use super::{describe_memo, describe_task, status_mark, Context, EditArgs, ListArgs, ListTarget};

const PREVIEW_CHARS: usize = 50;

#[derive(Serialize)]
struct ListReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    tasks: Option<Vec<&'a Task>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    memos: Option<Vec<&'a Memo>>,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ShowReport<'a> {
    Task {
        task: &'a Task,
        memos: Vec<&'a Memo>,
        missing_refs: Vec<&'a str>,
    },
    Memo {
        memo: &'a Memo,
        referenced_by: Vec<TaskSummary>,
    },
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RemoveReport {
    Task {
        id: String,
        title: String,
    },
    Memo {
        id: String,
        title: Option<String>,
        pruned: Vec<TaskSummary>,
    },
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EditReport<'a> {
    Task { task: &'a Task },
    Memo { memo: &'a Memo },
}

fn preview(content: &str) -> String {
    let first = content.lines().next().unwrap_or_default();
    if first.chars().count() > PREVIEW_CHARS {
        let cut: String = first.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        first.to_string()
    }
}

pub(crate) fn run_list(ctx: &Context, args: ListArgs) -> Result<()> {
    let store = ctx.load()?;
    let refs = args
        .refs
        .as_deref()
        .map(|input| resolve_memo_id(&store, input))
        .transpose()?;

    let want_tasks = matches!(args.target, ListTarget::Tasks | ListTarget::All);
    let want_memos = matches!(args.target, ListTarget::Memos | ListTarget::All);

    let tasks: Option<Vec<&Task>> = want_tasks.then(|| {
        store
            .sorted_tasks()
            .into_iter()
            .filter(|task| !(args.done && !task.done))
            .filter(|task| !(args.undone && task.done))
            .filter(|task| refs.as_deref().map_or(true, |memo_id| task.references(memo_id)))
            .collect()
    });
    // Memos never reference anything, so a --refs filter leaves none.
    let memos: Option<Vec<&Memo>> = want_memos.then(|| {
        store
            .memos
            .iter()
            .filter(|_| refs.is_none())
            .collect()
    });

    let mut human = HumanOutput::new(match args.target {
        ListTarget::Tasks => "Tasks",
        ListTarget::Memos => "Memos",
        ListTarget::All => "Tasks and memos",
    });
    if let Some(tasks) = &tasks {
        if tasks.is_empty() {
            human.push_detail("No tasks found");
        }
        for task in tasks {
            human.push_detail(format!(
                "{}  {}  {}  {}",
                ctx.short(&task.id),
                task.order,
                status_mark(task.done),
                task.title
            ));
        }
    }
    if let Some(memos) = &memos {
        if memos.is_empty() {
            human.push_detail("No memos found");
        }
        for memo in memos {
            human.push_detail(format!(
                "{}  {}  {}",
                ctx.short(&memo.id),
                memo.display_title(),
                preview(&memo.content)
            ));
        }
    }

    emit_success(ctx.output, "list", &ListReport { tasks, memos }, Some(&human))
}

pub(crate) fn run_show(ctx: &Context, input: &str) -> Result<()> {
    let store = ctx.load()?;
    match resolve_entity(&store, input)? {
        EntityRef::Task(id) => {
            let task = require_task(&store, &id)?;
            let human = describe_task(ctx, &store, task, format!("Task '{}'", task.title));
            let report = ShowReport::Task {
                task,
                memos: task
                    .memo_refs
                    .iter()
                    .filter_map(|memo_id| store.memo(memo_id))
                    .collect(),
                missing_refs: dangling_refs(&store, task),
            };
            emit_success(ctx.output, "show", &report, Some(&human))
        }
        EntityRef::Memo(id) => {
            let memo = require_memo(&store, &id)?;
            let human = describe_memo(ctx, &store, memo);
            let report = ShowReport::Memo {
                memo,
                referenced_by: store
                    .tasks_referencing(&memo.id)
                    .into_iter()
                    .map(Task::summary)
                    .collect(),
            };
            emit_success(ctx.output, "show", &report, Some(&human))
        }
    }
}

pub(crate) fn run_rm(ctx: &Context, input: &str, force: bool) -> Result<()> {
    let mut store = ctx.load()?;
    let (report, human) = match resolve_entity(&store, input)? {
        EntityRef::Task(id) => {
            let task = remove_task(&mut store, &id)?;
            let human = HumanOutput::new(format!("Task '{}' removed", task.title));
            (
                RemoveReport::Task {
                    id: task.id,
                    title: task.title,
                },
                human,
            )
        }
        EntityRef::Memo(id) => {
            let removed = remove_memo(&mut store, &id, force)?;
            let mut human =
                HumanOutput::new(format!("Memo '{}' removed", removed.memo.display_title()));
            for task in &removed.pruned {
                human.push_warning(format!(
                    "reference removed from task {}  {}",
                    ctx.short(&task.id),
                    task.title
                ));
            }
            (
                RemoveReport::Memo {
                    id: removed.memo.id,
                    title: removed.memo.title,
                    pruned: removed.pruned,
                },
                human,
            )
        }
    };
    ctx.save(&store)?;
    emit_success(ctx.output, "rm", &report, Some(&human))
}

pub(crate) fn run_edit(ctx: &Context, args: EditArgs) -> Result<()> {
    let mut store = ctx.load()?;
    let use_editor = args.editor || !args.has_field_edits();

    match resolve_entity(&store, &args.id)? {
        EntityRef::Task(id) => {
            if args.content.is_some() || args.clear_title {
                return Err(Error::InvalidArgument(
                    "--content and --clear-title only apply to memos".to_string(),
                ));
            }
            let (title, description, memo_refs) = if use_editor {
                let current = require_task(&store, &id)?;
                let edited = ctx.editor().edit(&render_task_document(current), "tamo-task-")?;
                let doc = parse_task_document(&edited)?;
                let refs = resolve_memo_refs(&store, &doc.memo_refs)?;
                (Some(doc.title), Some(doc.description), Some(refs))
            } else {
                let refs = args
                    .memos
                    .as_deref()
                    .map(|inputs| resolve_memo_refs(&store, inputs))
                    .transpose()?;
                (args.title, args.description, refs)
            };

            let task = store.require_task_mut(&id)?;
            if let Some(title) = title {
                task.set_title(&title)?;
            }
            if let Some(description) = description {
                task.set_description(description);
            }
            if let Some(memo_refs) = memo_refs {
                task.set_memo_refs(memo_refs);
            }
            let task = task.clone();
            ctx.save(&store)?;
            info!(task = %task.id, "edited task");

            let human = HumanOutput::new(format!("Task '{}' updated", task.title));
            emit_success(ctx.output, "edit", &EditReport::Task { task: &task }, Some(&human))
        }
        EntityRef::Memo(id) => {
            if args.description.is_some() || args.memos.is_some() {
                return Err(Error::InvalidArgument(
                    "--description and --memo only apply to tasks".to_string(),
                ));
            }
            let (title, content) = if use_editor {
                let current = require_memo(&store, &id)?;
                let edited = ctx
                    .editor()
                    .edit(&render_memo_document(Some(current)), "tamo-memo-")?;
                let doc = parse_memo_document(&edited);
                (Some(doc.title), Some(doc.content))
            } else if args.clear_title {
                (Some(None), args.content)
            } else {
                (args.title.map(Some), args.content)
            };

            let memo = store.require_memo_mut(&id)?;
            if let Some(title) = title {
                memo.set_title(title.filter(|title| !title.trim().is_empty()));
            }
            if let Some(content) = content {
                memo.set_content(content);
            }
            let memo = memo.clone();
            ctx.save(&store)?;
            info!(memo = %memo.id, "edited memo");

            let human = HumanOutput::new(format!("Memo '{}' updated", memo.display_title()));
            emit_success(ctx.output, "edit", &EditReport::Memo { memo: &memo }, Some(&human))
        }
    }
}

fn require_task<'a>(store: &'a Store, id: &str) -> Result<&'a Task> {
    store
        .task(id)
        .ok_or_else(|| Error::not_found(EntityKind::Task, id))
}

fn require_memo<'a>(store: &'a Store, id: &str) -> Result<&'a Memo> {
    store
        .memo(id)
        .ok_or_else(|| Error::not_found(EntityKind::Memo, id))
}

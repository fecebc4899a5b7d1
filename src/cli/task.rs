//! Task commands: add/push/unshift, done/undone, mv, pop/shift, next, flattask.

use std::io;

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::flatten::flatten_task;
use crate::ingest::{self, Ingested};
use crate::integrity::{remove_task, resolve_memo_refs, resolve_task_id};
use crate::model::{Memo, Store, Task};
use crate::ordering::{place_task, resolve_order, Placement};
use crate::output::{emit_success, emit_text, HumanOutput};

use super::{confirm, describe_task, Context, EndArgs, MoveArgs, TaskArgs};

#[derive(Serialize)]
struct AddReport<'a> {
    task: &'a Task,
    memos: &'a [Memo],
}

#[derive(Serialize)]
struct MoveReport<'a> {
    task: &'a Task,
    precision_exhausted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum EndAction {
    Shown,
    Done,
    Removed,
    Cancelled,
}

#[derive(Serialize)]
struct EndReport {
    action: EndAction,
    task: Option<Task>,
}

#[derive(Serialize)]
struct FlattenReport<'a> {
    id: &'a str,
    markdown: &'a str,
}

/// Which end of the ordered list `pop` / `shift` operate on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum End {
    First,
    Last,
}

pub(crate) fn run_add(ctx: &Context, args: TaskArgs, placement: Placement, command: &str) -> Result<()> {
    let mut store = ctx.load()?;

    let ingested = if let Some(path) = args.file.as_deref() {
        ingest::ingest_file(&store, path, &placement)?
    } else if args.from_stdin {
        ingest::ingest_reader(
            &store,
            io::stdin().lock(),
            &ctx.config.ingest.stdin_title,
            &placement,
        )?
    } else {
        let title = args.title.as_deref().unwrap_or_default();
        let memo_refs = resolve_memo_refs(&store, &args.memos)?;
        let mut task = Task::new(title, args.description.unwrap_or_default(), memo_refs)?;
        task.order = resolve_order(&store.tasks, None, &placement)?.order;
        Ingested {
            task,
            memos: Vec::new(),
        }
    };

    let task = ingested.task.clone();
    let memos = ingested.memos.clone();
    ingested.commit(&mut store)?;
    ctx.save(&store)?;
    info!(task = %task.id, order = task.order, memos = memos.len(), "added task");

    let mut human = HumanOutput::new(format!("Task '{}' added", task.title));
    human.push_summary("ID", task.id.clone());
    human.push_summary("Order", task.order.to_string());
    for memo in &memos {
        human.push_detail(format!("extracted memo {}", ctx.short(&memo.id)));
    }

    emit_success(
        ctx.output,
        command,
        &AddReport {
            task: &task,
            memos: &memos,
        },
        Some(&human),
    )
}

pub(crate) fn run_set_done(ctx: &Context, input: &str, done: bool) -> Result<()> {
    let mut store = ctx.load()?;
    let id = resolve_task_id(&store, input)?;
    let task = store.require_task_mut(&id)?;
    task.set_done(done);
    let task = task.clone();
    ctx.save(&store)?;

    let (command, verb) = if done {
        ("done", "marked as done")
    } else {
        ("undone", "marked as not done")
    };
    let human = HumanOutput::new(format!("Task '{}' {verb}", task.title));
    emit_success(ctx.output, command, &task, Some(&human))
}

fn parse_placement(store: &Store, args: &MoveArgs) -> Result<Placement> {
    match (args.position.as_str(), args.target.as_deref()) {
        ("before", Some(target)) => Ok(Placement::Before(resolve_task_id(store, target)?)),
        ("after", Some(target)) => Ok(Placement::After(resolve_task_id(store, target)?)),
        ("before" | "after", None) => Err(Error::InvalidArgument(format!(
            "'{}' needs a target task id",
            args.position
        ))),
        (raw, None) => raw
            .parse::<f64>()
            .map(Placement::At)
            .map_err(|_| Error::InvalidArgument(format!("invalid order value: {raw}"))),
        (raw, Some(_)) => Err(Error::InvalidArgument(format!(
            "expected 'before' or 'after', got '{raw}'"
        ))),
    }
}

pub(crate) fn run_move(ctx: &Context, args: MoveArgs) -> Result<()> {
    let mut store = ctx.load()?;
    let id = resolve_task_id(&store, &args.id)?;
    let placement = parse_placement(&store, &args)?;

    if args.strict {
        resolve_order(&store.tasks, Some(&id), &placement)?.strict()?;
    }
    let outcome = place_task(&mut store, &id, &placement)?;
    ctx.save(&store)?;

    let task = store
        .task(&id)
        .cloned()
        .ok_or_else(|| Error::OperationFailed(format!("task {id} vanished after move")))?;
    let mut human = HumanOutput::new(format!("Task '{}' moved", task.title));
    human.push_summary("Order", outcome.order.to_string());
    if outcome.precision_exhausted {
        human.push_warning(
            "order collided with a neighbour; assign an explicit order to separate them",
        );
    }

    emit_success(
        ctx.output,
        "mv",
        &MoveReport {
            task: &task,
            precision_exhausted: outcome.precision_exhausted,
        },
        Some(&human),
    )
}

pub(crate) fn run_end(ctx: &Context, args: EndArgs, end: End) -> Result<()> {
    let command = match end {
        End::First => "shift task",
        End::Last => "pop task",
    };
    let mut store = ctx.load()?;
    let picked = match end {
        End::First => store.first_task(),
        End::Last => store.last_task(),
    }
    .cloned();

    let Some(task) = picked else {
        let human = HumanOutput::new("No tasks found");
        return emit_success(
            ctx.output,
            command,
            &EndReport {
                action: EndAction::Shown,
                task: None,
            },
            Some(&human),
        );
    };

    let (action, human) = if args.done {
        store.require_task_mut(&task.id)?.set_done(true);
        ctx.save(&store)?;
        (
            EndAction::Done,
            HumanOutput::new(format!("Task '{}' marked as done", task.title)),
        )
    } else if args.rm {
        if !args.force && !confirm(&format!("Remove task '{}'?", task.title))? {
            (EndAction::Cancelled, HumanOutput::new("Removal cancelled"))
        } else {
            remove_task(&mut store, &task.id)?;
            ctx.save(&store)?;
            (
                EndAction::Removed,
                HumanOutput::new(format!("Task '{}' removed", task.title)),
            )
        }
    } else {
        let header = match end {
            End::First => "First task",
            End::Last => "Last task",
        };
        (
            EndAction::Shown,
            describe_task(ctx, &store, &task, header.to_string()),
        )
    };

    let task = store.task(&task.id).cloned().or(Some(task));
    emit_success(ctx.output, command, &EndReport { action, task }, Some(&human))
}

pub(crate) fn run_next(ctx: &Context) -> Result<()> {
    let store = ctx.load()?;
    match store.next_undone() {
        Some(task) => {
            let human = describe_task(ctx, &store, task, "Next task".to_string());
            emit_success(ctx.output, "next", &Some(task), Some(&human))
        }
        None => {
            let human = HumanOutput::new("No undone tasks");
            emit_success(ctx.output, "next", &None::<&Task>, Some(&human))
        }
    }
}

pub(crate) fn run_flatten(ctx: &Context, input: &str) -> Result<()> {
    let store = ctx.load()?;
    let id = resolve_task_id(&store, input)?;
    let markdown = flatten_task(&store, &id, ctx.config.display.short_id_len)?;
    emit_text(
        ctx.output,
        "flattask",
        &FlattenReport {
            id: &id,
            markdown: &markdown,
        },
        &markdown,
    )
}

//! Command-line interface for tamo
//!
//! This module defines the CLI structure using clap derive macros.
//! Command families live in their own submodules.

use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::editor::Editor;
use crate::error::Result;
use crate::model::{short_id, Memo, Store, Task};
use crate::ordering::Placement;
use crate::output::{HumanOutput, OutputOptions};
use crate::storage::Storage;

mod entity;
mod init;
mod memo;
mod task;

/// tamo - ordered tasks interlinked with free-form memos
#[derive(Parser, Debug)]
#[command(name = "tamo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to `.tamo` or `[storage] dir` in .tamo.toml)
    #[arg(long, global = true, env = "TAMO_DIR")]
    pub dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize tamo in the current directory
    Init {
        /// Also write a default .tamo.toml if none exists
        #[arg(long)]
        config: bool,
    },

    /// Add a new task or memo
    #[command(subcommand)]
    Add(AddCommands),

    /// Add a new task at the end of the list
    #[command(subcommand)]
    Push(QueueCommands),

    /// Add a new task at the beginning of the list
    #[command(subcommand)]
    Unshift(QueueCommands),

    /// List tasks and/or memos
    List(ListArgs),

    /// Show details of a task or memo
    Show {
        /// Task or memo id (a unique prefix is enough)
        id: String,
    },

    /// Remove a task or memo
    Rm {
        /// Task or memo id
        id: String,

        /// Remove a memo even if tasks still reference it
        #[arg(short, long)]
        force: bool,
    },

    /// Edit a task or memo
    Edit(EditArgs),

    /// Mark a task as done
    Done {
        /// Task id
        id: String,
    },

    /// Mark a task as not done
    Undone {
        /// Task id
        id: String,
    },

    /// Move a task to a specific order or relative to another task
    Mv(MoveArgs),

    /// Show, mark as done, or remove the last task
    #[command(subcommand)]
    Pop(EndCommands),

    /// Show, mark as done, or remove the first task
    #[command(subcommand)]
    Shift(EndCommands),

    /// Show the first undone task
    Next,

    /// Print a task as Markdown with its memos expanded
    Flattask {
        /// Task id
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum AddCommands {
    /// Add a task at the end of the list
    Task(TaskArgs),
    /// Add a memo
    Memo(MemoArgs),
}

#[derive(Subcommand, Debug)]
pub enum QueueCommands {
    /// The new task
    Task(TaskArgs),
}

#[derive(Subcommand, Debug)]
pub enum EndCommands {
    /// Operate on a task at this end of the list
    Task(EndArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TaskArgs {
    /// Task title
    #[arg(
        required_unless_present_any = ["file", "from_stdin"],
        conflicts_with_all = ["file", "from_stdin"]
    )]
    pub title: Option<String>,

    /// Task description
    #[arg(short, long, conflicts_with_all = ["file", "from_stdin"])]
    pub description: Option<String>,

    /// Memo ids the task references (comma separated or repeated)
    #[arg(short, long = "memo", value_delimiter = ',', conflicts_with_all = ["file", "from_stdin"])]
    pub memos: Vec<String>,

    /// Create the task from a Markdown file
    #[arg(short, long, conflicts_with = "from_stdin")]
    pub file: Option<PathBuf>,

    /// Create the task from Markdown read on stdin
    #[arg(long)]
    pub from_stdin: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MemoArgs {
    /// Memo title
    pub title: Option<String>,

    /// Memo content
    #[arg(short, long, conflicts_with_all = ["from_stdin", "editor"])]
    pub content: Option<String>,

    /// Read content from stdin (the default when no other source is given)
    #[arg(long, conflicts_with = "editor")]
    pub from_stdin: bool,

    /// Write the memo in the external editor
    #[arg(short, long)]
    pub editor: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListTarget {
    Tasks,
    Memos,
    All,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// What to list
    #[arg(value_enum, default_value_t = ListTarget::Tasks)]
    pub target: ListTarget,

    /// Only completed tasks
    #[arg(long, conflicts_with = "undone")]
    pub done: bool,

    /// Only uncompleted tasks
    #[arg(long)]
    pub undone: bool,

    /// Only tasks referencing this memo
    #[arg(long, value_name = "MEMO_ID")]
    pub refs: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Task or memo id
    pub id: String,

    /// Edit in the external editor (the default when no field flag is given)
    #[arg(short, long, conflicts_with_all = ["title", "description", "memos", "content", "clear_title"])]
    pub editor: bool,

    /// New title
    #[arg(short, long)]
    pub title: Option<String>,

    /// New task description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Replace the task's memo references (comma separated or repeated)
    #[arg(short, long = "memo", value_delimiter = ',', num_args = 0..)]
    pub memos: Option<Vec<String>>,

    /// New memo content
    #[arg(short, long)]
    pub content: Option<String>,

    /// Remove the memo's title
    #[arg(long, conflicts_with = "title")]
    pub clear_title: bool,
}

impl EditArgs {
    fn has_field_edits(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.memos.is_some()
            || self.content.is_some()
            || self.clear_title
    }
}

#[derive(Args, Debug, Clone)]
pub struct MoveArgs {
    /// Task to move
    pub id: String,

    /// New order value, or `before` / `after`
    #[arg(allow_negative_numbers = true)]
    pub position: String,

    /// Task to move before or after
    pub target: Option<String>,

    /// Fail instead of placing a task when the order gap is exhausted
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EndArgs {
    /// Mark the task as done
    #[arg(long, conflicts_with = "rm")]
    pub done: bool,

    /// Remove the task
    #[arg(long)]
    pub rm: bool,

    /// Remove without asking for confirmation
    #[arg(short, long, requires = "rm")]
    pub force: bool,
}

impl Cli {
    /// Run the CLI command
    pub fn run(self) -> Result<()> {
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        let ctx = Context::new(self.dir, output)?;

        match self.command {
            Commands::Init { config } => init::run(&ctx, config),
            Commands::Add(AddCommands::Task(args)) => {
                task::run_add(&ctx, args, Placement::End, "add task")
            }
            Commands::Add(AddCommands::Memo(args)) => memo::run_add(&ctx, args),
            Commands::Push(QueueCommands::Task(args)) => {
                task::run_add(&ctx, args, Placement::End, "push task")
            }
            Commands::Unshift(QueueCommands::Task(args)) => {
                task::run_add(&ctx, args, Placement::Start, "unshift task")
            }
            Commands::List(args) => entity::run_list(&ctx, args),
            Commands::Show { id } => entity::run_show(&ctx, &id),
            Commands::Rm { id, force } => entity::run_rm(&ctx, &id, force),
            Commands::Edit(args) => entity::run_edit(&ctx, args),
            Commands::Done { id } => task::run_set_done(&ctx, &id, true),
            Commands::Undone { id } => task::run_set_done(&ctx, &id, false),
            Commands::Mv(args) => task::run_move(&ctx, args),
            Commands::Pop(EndCommands::Task(args)) => task::run_end(&ctx, args, task::End::Last),
            Commands::Shift(EndCommands::Task(args)) => task::run_end(&ctx, args, task::End::First),
            Commands::Next => task::run_next(&ctx),
            Commands::Flattask { id } => task::run_flatten(&ctx, &id),
        }
    }
}

/// Everything a command needs: configuration, storage and output mode.
pub(crate) struct Context {
    pub root: PathBuf,
    pub config: Config,
    pub storage: Storage,
    pub output: OutputOptions,
}

impl Context {
    fn new(dir: Option<PathBuf>, output: OutputOptions) -> Result<Self> {
        let root = std::env::current_dir()?;
        let config = Config::load_from_dir(&root);
        let storage = Storage::from_config(&root, &config.storage, dir.as_deref());
        Ok(Self {
            root,
            config,
            storage,
            output,
        })
    }

    pub fn load(&self) -> Result<Store> {
        self.storage.load()
    }

    pub fn save(&self, store: &Store) -> Result<()> {
        self.storage.save(store)
    }

    pub fn short<'a>(&self, id: &'a str) -> &'a str {
        short_id(id, self.config.display.short_id_len)
    }

    pub fn editor(&self) -> Editor {
        Editor::from_config(&self.config.editor)
    }
}

pub(crate) fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin().lock().read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Ask a yes/no question on stderr; anything but `y`/`yes` is a no.
pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    let mut stderr = io::stderr();
    write!(stderr, "{prompt} [y/N]: ")?;
    stderr.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

pub(crate) fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn status_mark(done: bool) -> &'static str {
    if done {
        "[x]"
    } else {
        "[ ]"
    }
}

/// Human view of a task with its referenced memos
pub(crate) fn describe_task(ctx: &Context, store: &Store, task: &Task, header: String) -> HumanOutput {
    let mut human = HumanOutput::new(header);
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Order", task.order.to_string());
    human.push_summary(
        "Status",
        if task.done {
            "[x] Completed"
        } else {
            "[ ] Not completed"
        },
    );
    human.push_summary("Created", format_timestamp(&task.created_at));
    human.push_summary("Updated", format_timestamp(&task.updated_at));
    human.set_body(task.description.clone());
    for memo_id in &task.memo_refs {
        match store.memo(memo_id) {
            Some(memo) => human.push_detail(format!(
                "{}  {}",
                ctx.short(memo_id),
                memo.display_title()
            )),
            None => human.push_detail(format!("{}  <memo not found>", ctx.short(memo_id))),
        }
    }
    human
}

/// Human view of a memo with the tasks referencing it
pub(crate) fn describe_memo(ctx: &Context, store: &Store, memo: &Memo) -> HumanOutput {
    let mut human = HumanOutput::new(format!("Memo '{}'", memo.display_title()));
    human.push_summary("ID", memo.id.clone());
    human.push_summary("Title", memo.display_title().to_string());
    human.push_summary("Created", format_timestamp(&memo.created_at));
    human.push_summary("Updated", format_timestamp(&memo.updated_at));
    human.set_body(memo.content.clone());
    for task in store.tasks_referencing(&memo.id) {
        human.push_detail(format!(
            "referenced by {}  {}  {}",
            ctx.short(&task.id),
            status_mark(task.done),
            task.title
        ));
    }
    human
}

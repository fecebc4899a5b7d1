//! tamo - task and memo tracker
//!
//! Keeps an ordered list of tasks interlinked with free-form memos in a
//! single JSON file.
//!
//! # Core Concepts
//!
//! - **Tasks**: completable work items positioned by a fractional order key
//! - **Memos**: notes with an optional title, referenced from tasks by id
//! - **Ingestion**: a Markdown document becomes a task, with every
//!   ```` ```memo ```` block lifted out into its own memo
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.tamo.toml`
//! - `error`: Error types and result aliases
//! - `model`: Task, Memo and Store records
//! - `ordering`: Append, prepend and midpoint placement of tasks
//! - `integrity`: Id prefix resolution and memo reference integrity
//! - `ingest`: Markdown to task + memos
//! - `flatten`: Task rendered as Markdown with memos inlined
//! - `editor`: External editor and the documents edited through it
//! - `storage`: Data file init, load and atomic save
//! - `output`: Human and JSON output envelopes

pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod flatten;
pub mod ingest;
pub mod integrity;
pub mod model;
pub mod ordering;
pub mod output;
pub mod storage;

pub use error::{Error, Result};

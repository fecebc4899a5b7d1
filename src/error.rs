//! Error types for tamo
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown or ambiguous id, malformed input)
//! - 3: Blocked (memo still referenced, strict placement collapsed)
//! - 4: Operation failed (I/O, serialization, editor)

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Exit codes for tamo CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Kind of record an identifier was looked up against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Task,
    Memo,
    TaskOrMemo,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Task => write!(f, "task"),
            EntityKind::Memo => write!(f, "memo"),
            EntityKind::TaskOrMemo => write!(f, "task or memo"),
        }
    }
}

/// Minimal view of a task, carried by errors and command output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub id: String,
    pub title: String,
}

/// Main error type for tamo operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("tamo is not initialized: {0} not found (run `tamo init`)")]
    NotInitialized(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("ambiguous {kind} id '{input}': matches {}", candidates.join(", "))]
    AmbiguousReference {
        kind: EntityKind,
        input: String,
        candidates: Vec<String>,
    },

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    // Blocked (exit code 3)
    #[error("memo {memo_id} is referenced by {} task(s)", tasks.len())]
    ReferentialConflict {
        memo_id: String,
        tasks: Vec<TaskSummary>,
    },

    #[error("order precision exhausted: placement collapsed onto {order}")]
    PrecisionExhausted { order: f64 },

    // Operation failures (exit code 4)
    #[error("Editor error: {0}")]
    Editor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::NotInitialized(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::NotFound { .. }
            | Error::AmbiguousReference { .. }
            | Error::MalformedDocument(_) => exit_codes::USER_ERROR,

            // Blocked
            Error::ReferentialConflict { .. } | Error::PrecisionExhausted { .. } => {
                exit_codes::BLOCKED
            }

            // Operation failures
            Error::Editor(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for machine-readable error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::NotInitialized(path) => Some(json!({ "path": path })),
            Error::InvalidConfig(message)
            | Error::InvalidArgument(message)
            | Error::MalformedDocument(message) => Some(json!({ "message": message })),
            Error::NotFound { kind, id } => Some(json!({ "kind": kind, "id": id })),
            Error::AmbiguousReference {
                kind,
                input,
                candidates,
            } => Some(json!({
                "kind": kind,
                "input": input,
                "candidates": candidates,
            })),
            Error::ReferentialConflict { memo_id, tasks } => Some(json!({
                "memo_id": memo_id,
                "tasks": tasks,
            })),
            Error::PrecisionExhausted { order } => Some(json!({ "order": order })),
            _ => None,
        }
    }
}

/// Result type alias for tamo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}

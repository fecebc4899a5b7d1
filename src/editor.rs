//! External editor support and the Markdown documents edited through it.
//!
//! Task document:
//!
//! ```text
//! # <title>
//!
//! <description>
//!
//! # Memo References (one ID per line):
//! <memo id>
//! ```
//!
//! Memo document: a first line `# <title>` (`# ` alone for no title)
//! followed by the content.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, ExitStatus};

use tempfile::Builder;
use tracing::debug;

use crate::config::EditorConfig;
use crate::error::{Error, Result};
use crate::model::{Memo, Task};

const REFS_MARKER: &str = "# Memo References";
const REFS_HEADING: &str = "# Memo References (one ID per line):";

/// Fields recovered from an edited task document
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDocument {
    pub title: String,
    pub description: String,
    /// Raw reference lines, still to be resolved against the store
    pub memo_refs: Vec<String>,
}

/// Fields recovered from an edited memo document
#[derive(Debug, Clone, PartialEq)]
pub struct MemoDocument {
    pub title: Option<String>,
    pub content: String,
}

pub fn render_task_document(task: &Task) -> String {
    format!(
        "# {}\n\n{}\n\n{}\n{}\n",
        task.title,
        task.description,
        REFS_HEADING,
        task.memo_refs.join("\n")
    )
}

/// Parse a task document.
///
/// The first `# ` line is the title. Lines after it up to the references
/// heading form the description; non-blank, non-heading lines after that
/// heading are references.
pub fn parse_task_document(text: &str) -> Result<TaskDocument> {
    enum Section {
        Title,
        Description,
        Refs,
    }

    let mut section = Section::Title;
    let mut title = String::new();
    let mut description = String::new();
    let mut memo_refs = Vec::new();

    for line in text.lines() {
        match section {
            Section::Title => {
                if let Some(rest) = line.strip_prefix("# ") {
                    title = rest.trim().to_string();
                    section = Section::Description;
                }
            }
            Section::Description => {
                if line.starts_with(REFS_MARKER) {
                    section = Section::Refs;
                } else {
                    description.push_str(line);
                    description.push('\n');
                }
            }
            Section::Refs => {
                let line = line.trim();
                if !line.is_empty() && !line.starts_with('#') {
                    memo_refs.push(line.to_string());
                }
            }
        }
    }

    if title.is_empty() {
        return Err(Error::MalformedDocument(
            "task document needs a '# <title>' line".to_string(),
        ));
    }
    Ok(TaskDocument {
        title,
        description: description.trim().to_string(),
        memo_refs,
    })
}

pub fn render_memo_document(memo: Option<&Memo>) -> String {
    match memo {
        Some(memo) => format!(
            "# {}\n\n{}\n",
            memo.title.as_deref().unwrap_or_default(),
            memo.content
        ),
        None => "# \n\n".to_string(),
    }
}

/// Parse a memo document. A first line that is not a heading means the
/// whole text is content.
pub fn parse_memo_document(text: &str) -> MemoDocument {
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
    let heading = first
        .strip_prefix("# ")
        .or_else(|| (first.trim_end() == "#").then_some(""));

    match heading {
        Some(title) => {
            let title = title.trim();
            MemoDocument {
                title: (!title.is_empty()).then(|| title.to_string()),
                content: rest.trim().to_string(),
            }
        }
        None => MemoDocument {
            title: None,
            content: text.trim().to_string(),
        },
    }
}

/// Launches the user's editor on a temporary Markdown file
#[derive(Debug, Clone, Default)]
pub struct Editor {
    configured: Option<String>,
}

impl Editor {
    pub fn new(command: Option<String>) -> Self {
        Self {
            configured: command.filter(|command| !command.trim().is_empty()),
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.command.clone())
    }

    /// Open `initial` in the editor and return the saved buffer.
    pub fn edit(&self, initial: &str, prefix: &str) -> Result<String> {
        let mut temp = Builder::new()
            .prefix(prefix)
            .suffix(".md")
            .tempfile()
            .map_err(|err| Error::Editor(format!("failed to create temp file: {err}")))?;
        temp.write_all(initial.as_bytes())?;
        temp.flush()?;

        let status = self.launch(temp.path())?;
        if !status.success() {
            let detail = status
                .code()
                .map(|code| format!("exit code {code}"))
                .unwrap_or_else(|| "signal".to_string());
            return Err(Error::Editor(format!("editor exited with {detail}")));
        }

        std::fs::read_to_string(temp.path())
            .map_err(|err| Error::Editor(format!("failed to read editor buffer: {err}")))
    }

    fn candidates(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(command) = &self.configured {
            out.push(command.clone());
        }
        for var in ["VISUAL", "EDITOR"] {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    out.push(value);
                }
            }
        }
        out.push("vi".to_string());
        out
    }

    fn launch(&self, path: &Path) -> Result<ExitStatus> {
        let mut attempted: Vec<String> = Vec::new();
        for candidate in self.candidates() {
            let parts = split_editor_command(&candidate);
            let Some((program, args)) = parts.split_first() else {
                continue;
            };
            attempted.push(program.clone());
            debug!(editor = %program, path = %path.display(), "launching editor");
            match Command::new(program).args(args).arg(path).status() {
                Ok(status) => return Ok(status),
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => {
                    return Err(Error::Editor(format!(
                        "failed to launch editor '{program}': {err}"
                    )))
                }
            }
        }
        Err(Error::Editor(format!(
            "no editor found (tried {}); set $VISUAL or $EDITOR",
            attempted.join(", ")
        )))
    }
}

fn split_editor_command(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

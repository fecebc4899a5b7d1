//! Shared output formatting for tamo commands.
//!
//! Human output is a header followed by optional summary, details, warnings
//! and next-step sections. With `--json` every command prints one envelope
//! carrying the same information.

use serde::Serialize;

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: &str = "tamo.v1";

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    body: Option<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            body: None,
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    /// Free-form text printed verbatim after the summary
    pub fn set_body(&mut self, body: impl Into<String>) {
        let body = body.into();
        self.body = (!body.trim().is_empty()).then_some(body);
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let warnings = human.map(|h| h.warnings.clone()).unwrap_or_default();
        let next_steps = human.map(|h| h.next_steps.clone()).unwrap_or_default();

        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings,
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        println!("{}", format_human(human));
    }

    Ok(())
}

/// Print raw text (e.g. a flattened document) unless JSON output was asked for.
pub fn emit_text<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    text: &str,
) -> Result<()> {
    if options.json {
        return emit_success(options, command, data, None);
    }
    if !options.quiet {
        print!("{text}");
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    let hint = next_steps.first().map(|step| step.as_str());
    if json {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            message: &'a str,
            code: i32,
            kind: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<serde_json::Value>,
        }

        #[derive(Serialize)]
        struct Envelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: ErrorBody<'a>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: ErrorBody {
                message: &err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            },
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Error::ReferentialConflict { tasks, .. } = err {
        for task in tasks {
            eprintln!("  - {} {}", task.id, task.title);
        }
    }
    if let Some(hint) = hint {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = Vec::new();
    lines.push(output.header.clone());

    push_summary(&mut lines, &output.summary);
    if let Some(body) = &output.body {
        lines.push(String::new());
        lines.push(body.trim_end().to_string());
    }
    push_section(&mut lines, "Details", &output.details);
    push_section(&mut lines, "Warnings", &output.warnings);
    push_section(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

/// Command name for the error envelope, recovered from raw arguments since
/// clap may not have produced a `Cli` yet.
pub fn infer_command_name_from_args() -> String {
    infer_command_name(std::env::args().skip(1))
}

fn infer_command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut args = args.into_iter();
    let mut positional = || loop {
        match args.next() {
            Some(arg) if arg == "--dir" => {
                args.next();
            }
            Some(arg) if arg.starts_with('-') => continue,
            other => return other,
        }
    };

    let command = match positional() {
        Some(cmd) => cmd,
        None => return "tamo".to_string(),
    };

    if matches!(
        command.as_str(),
        "add" | "push" | "unshift" | "pop" | "shift" | "list"
    ) {
        if let Some(sub) = positional() {
            if matches!(sub.as_str(), "task" | "memo" | "tasks" | "memos" | "all") {
                return format!("{command} {sub}");
            }
        }
    }
    command
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        2 => "user_error",
        3 => "blocked",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::NotInitialized(_) => vec!["tamo init".to_string()],
        Error::ReferentialConflict { memo_id, .. } => {
            vec![format!("tamo rm {memo_id} --force")]
        }
        Error::AmbiguousReference { .. } => {
            vec!["use a longer id prefix".to_string()]
        }
        Error::NotFound { .. } => vec!["tamo list all".to_string()],
        Error::PrecisionExhausted { .. } => {
            vec!["place the task with an explicit order: tamo mv <id> <order>".to_string()]
        }
        Error::InvalidConfig(_) => vec!["fix .tamo.toml then retry".to_string()],
        Error::Editor(_) => vec!["set $VISUAL or $EDITOR".to_string()],
        _ => Vec::new(),
    }
}

fn push_summary(lines: &mut Vec<String>, summary: &[(String, String)]) {
    if summary.is_empty() {
        return;
    }

    lines.push(String::new());
    for (key, value) in summary {
        if value.is_empty() {
            lines.push(key.clone());
        } else {
            lines.push(format!("{key}: {value}"));
        }
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EntityKind, TaskSummary};

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn command_name_includes_entity_subcommand() {
        assert_eq!(infer_command_name(args(&["add", "task", "x"])), "add task");
        assert_eq!(infer_command_name(args(&["--json", "pop", "task"])), "pop task");
        assert_eq!(infer_command_name(args(&["list"])), "list");
        assert_eq!(infer_command_name(args(&["show", "abc"])), "show");
        assert_eq!(infer_command_name(args(&["--dir", "x", "next"])), "next");
        assert_eq!(infer_command_name(args(&[])), "tamo");
    }

    #[test]
    fn human_format_sections() {
        let mut out = HumanOutput::new("Task 'A'");
        out.push_summary("id", "1234");
        out.push_summary("Completed", "");
        out.set_body("line one\nline two\n");
        out.push_warning("careful");
        out.push_next_step("tamo next");

        assert_eq!(
            format_human(&out),
            "Task 'A'\n\nid: 1234\nCompleted\n\nline one\nline two\n\nWarnings:\n- careful\n\nNext steps:\n- tamo next"
        );
    }

    #[test]
    fn blank_body_is_dropped() {
        let mut out = HumanOutput::new("h");
        out.set_body("   \n");
        assert_eq!(format_human(&out), "h");
    }

    #[test]
    fn conflict_hint_suggests_force() {
        let err = Error::ReferentialConflict {
            memo_id: "m1".to_string(),
            tasks: vec![TaskSummary {
                id: "t1".to_string(),
                title: "T".to_string(),
            }],
        };
        assert_eq!(error_next_steps(&err), vec!["tamo rm m1 --force".to_string()]);
        assert_eq!(error_kind(&err), "blocked");

        let err = Error::not_found(EntityKind::Memo, "zz");
        assert_eq!(error_kind(&err), "user_error");
    }
}

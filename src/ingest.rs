//! Markdown ingestion: one document becomes one task plus its memos.
//!
//! The first non-blank `# ` heading gives the task title. Every fenced block
//! opened with ```` ```memo ```` and closed by a bare ```` ``` ```` line is
//! lifted out into an untitled memo and replaced in the text by a
//! `[memo](<id>)` marker. Other fenced blocks are code and stay as they are.
//! What remains, trimmed, is the task description.

use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Memo, Store, Task};
use crate::ordering::{resolve_order, Placement};

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^# (.+)$").expect("valid title regex"));

const FENCE: &str = "```";
const MEMO_FENCE: &str = "```memo";

/// Inline marker left in a description where a memo was extracted
pub fn memo_marker(memo_id: &str) -> String {
    format!("[memo]({memo_id})")
}

/// Document split into its parts, not yet attached to a store
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub title: String,
    pub description: String,
    /// Extracted memos in document order
    pub memos: Vec<Memo>,
}

/// A task and the memos extracted for it, ready to commit together
#[derive(Debug, Clone)]
pub struct Ingested {
    pub task: Task,
    pub memos: Vec<Memo>,
}

impl Ingested {
    /// Add the task and its memos to `store`; returns the task id.
    pub fn commit(self, store: &mut Store) -> Result<String> {
        let id = self.task.id.clone();
        store.commit(self.task, self.memos)?;
        Ok(id)
    }
}

/// Split a document into title, description and memos.
///
/// `default_title` is used when the document has no usable heading.
pub fn parse_document(text: &str, default_title: Option<&str>) -> Result<ParsedDocument> {
    let mut body = text.to_string();

    let heading = TITLE_RE.captures_iter(text).find_map(|caps| {
        let full = caps.get(0)?;
        let title = caps.get(1)?.as_str().trim();
        (!title.is_empty()).then(|| (full.range(), title.to_string()))
    });

    let title = match heading {
        Some((range, title)) => {
            body.replace_range(range, "");
            title
        }
        None => default_title
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::MalformedDocument(
                    "document has no '# ' heading and no default title was given".to_string(),
                )
            })?,
    };

    let (description, memos) = extract_memo_blocks(&body);
    Ok(ParsedDocument {
        title,
        description: description.trim().to_string(),
        memos,
    })
}

/// One line of a document: byte offsets into the source, newline excluded.
struct Line<'a> {
    start: usize,
    end: usize,
    /// Line text with trailing whitespace removed, for fence matching
    text: &'a str,
}

fn split_lines(text: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for raw in text.split_inclusive('\n') {
        let content = raw.strip_suffix('\n').unwrap_or(raw);
        let content = content.strip_suffix('\r').unwrap_or(content);
        lines.push(Line {
            start,
            end: start + content.len(),
            text: content.trim_end(),
        });
        start += raw.len();
    }
    lines
}

/// Index (within `rest`) of the line closing a memo block, if the block is
/// closed before the document ends or another fence opens.
fn closing_fence(rest: &[Line<'_>]) -> Option<usize> {
    for (idx, line) in rest.iter().enumerate() {
        if line.text == FENCE {
            return Some(idx);
        }
        if line.text.starts_with(FENCE) {
            return None;
        }
    }
    None
}

/// Replace every closed ```` ```memo ```` block with a marker.
///
/// Unclosed blocks and the contents of other fenced blocks stay verbatim.
fn extract_memo_blocks(body: &str) -> (String, Vec<Memo>) {
    let lines = split_lines(body);
    let mut out = String::with_capacity(body.len());
    let mut memos = Vec::new();
    let mut copied = 0;
    let mut idx = 0;

    while idx < lines.len() {
        let line = &lines[idx];
        if line.text == MEMO_FENCE {
            if let Some(offset) = closing_fence(&lines[idx + 1..]) {
                let close = &lines[idx + 1 + offset];
                let content = if offset == 0 {
                    ""
                } else {
                    &body[lines[idx + 1].start..lines[idx + offset].end]
                };
                let memo = Memo::new(None, content);
                out.push_str(&body[copied..line.start]);
                out.push_str(&memo_marker(&memo.id));
                copied = close.end;
                memos.push(memo);
                idx += offset + 2;
                continue;
            }
        } else if line.text.starts_with(FENCE) {
            // Skip a foreign fenced block up to its closing line.
            idx += lines[idx + 1..]
                .iter()
                .position(|line| line.text == FENCE)
                .map_or(lines.len() - idx, |offset| offset + 2);
            continue;
        }
        idx += 1;
    }

    out.push_str(&body[copied..]);
    (out, memos)
}

/// Build a task (positioned by `placement`) and its memos from a document.
pub fn ingest(
    store: &Store,
    text: &str,
    default_title: Option<&str>,
    placement: &Placement,
) -> Result<Ingested> {
    let parsed = parse_document(text, default_title)?;
    let memo_refs = parsed.memos.iter().map(|memo| memo.id.clone()).collect();
    let mut task = Task::new(&parsed.title, parsed.description, memo_refs)?;
    task.order = resolve_order(&store.tasks, None, placement)?.order;
    debug!(
        task = %task.id,
        title = %task.title,
        memos = parsed.memos.len(),
        "ingested document"
    );
    Ok(Ingested {
        task,
        memos: parsed.memos,
    })
}

/// Ingest a Markdown file; the file stem is the fallback title.
pub fn ingest_file(store: &Store, path: &Path, placement: &Placement) -> Result<Ingested> {
    let text = std::fs::read_to_string(path)?;
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned());
    ingest(store, &text, stem.as_deref(), placement)
}

/// Ingest a document read to the end from `reader`.
pub fn ingest_reader<R: Read>(
    store: &Store,
    mut reader: R,
    default_title: &str,
    placement: &Placement,
) -> Result<Ingested> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    ingest(store, &text, Some(default_title), placement)
}

//! tamo add memo

use tracing::info;

use crate::editor::{parse_memo_document, render_memo_document};
use crate::error::{Error, Result};
use crate::model::Memo;
use crate::output::{emit_success, HumanOutput};

use super::{read_stdin, Context, MemoArgs};

pub(crate) fn run_add(ctx: &Context, args: MemoArgs) -> Result<()> {
    let mut store = ctx.load()?;

    let title = args.title.filter(|title| !title.trim().is_empty());
    let (title, content) = if let Some(content) = args.content {
        (title, content)
    } else if args.editor {
        let mut initial = render_memo_document(None);
        if let Some(title) = title.as_deref() {
            initial = format!("# {title}\n\n");
        }
        let edited = ctx.editor().edit(&initial, "tamo-memo-")?;
        let doc = parse_memo_document(&edited);
        (doc.title, doc.content)
    } else {
        let content = read_stdin()?;
        (title, content.trim_end().to_string())
    };

    if title.is_none() && content.trim().is_empty() {
        return Err(Error::InvalidArgument(
            "memo needs a title or some content".to_string(),
        ));
    }

    let memo = Memo::new(title, content);
    store.add_memo(memo.clone())?;
    ctx.save(&store)?;
    info!(memo = %memo.id, "added memo");

    let mut human = HumanOutput::new(format!("Memo '{}' added", memo.display_title()));
    human.push_summary("ID", memo.id.clone());
    human.push_next_step(format!("tamo add task <title> -m {}", ctx.short(&memo.id)));

    emit_success(ctx.output, "add memo", &memo, Some(&human))
}

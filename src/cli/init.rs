//! tamo init command implementation
//!
//! Creates the data directory with an empty store, and optionally a default
//! `.tamo.toml`.

use std::path::PathBuf;

use crate::config::{Config, CONFIG_FILE};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

use super::Context;

#[derive(serde::Serialize)]
struct InitReport {
    data_file: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    store: bool,
    config: bool,
}

pub(crate) fn run(ctx: &Context, write_config: bool) -> Result<()> {
    let created_store = ctx.storage.init()?;
    let created_config = if write_config {
        ensure_config(ctx)?
    } else {
        false
    };

    let data_file = ctx.storage.data_file();
    let report = InitReport {
        data_file: data_file.clone(),
        created: InitCreated {
            store: created_store,
            config: created_config,
        },
    };

    let mut created_items = Vec::new();
    if created_store {
        created_items.push(data_file.display().to_string());
    }
    if created_config {
        created_items.push(CONFIG_FILE.to_string());
    }

    let header = if created_items.is_empty() {
        "tamo init: already initialized".to_string()
    } else {
        "tamo init: initialized".to_string()
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("data", data_file.display().to_string());
    human.push_summary(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    human.push_next_step("tamo add task \"<title>\"");
    human.push_next_step("tamo add task -f <file.md>");

    emit_success(ctx.output, "init", &report, Some(&human))
}

fn ensure_config(ctx: &Context) -> Result<bool> {
    let path = ctx.root.join(CONFIG_FILE);
    if path.exists() {
        return Ok(false);
    }
    Config::default().save(&path)?;
    Ok(true)
}

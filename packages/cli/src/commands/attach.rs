use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use jotter_editor::SaveOutcome;
use jotter_workspace::open_entry;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use super::fail_on_errors;

#[derive(Debug, Args)]
pub struct AttachArgs {
    /// Entry id
    pub entry: String,

    /// File to attach
    pub file: PathBuf,
}

pub fn attach(args: AttachArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let entries = config.entries(cwd);
    let mut session = open_entry(&entries, &args.entry, config.editor)?;

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let imported = runtime.block_on(session.attach_file(&args.file, Instant::now()));

    let Some(imported) = imported else {
        warn!(entry = %args.entry, file = %args.file.display(), "Attach failed");
        fail_on_errors(session.take_notifications())?;
        return Err(anyhow!("Nothing attached"));
    };

    let outcome = session.save();
    info!(
        entry = %args.entry,
        asset_path = %imported.asset_path,
        deduplicated = imported.deduplicated,
        ?outcome,
        "Saved attachment"
    );
    if outcome == SaveOutcome::Failed {
        fail_on_errors(session.take_notifications())?;
    }

    let note = if imported.deduplicated {
        " (already stored)".dimmed().to_string()
    } else {
        String::new()
    };
    println!(
        "{} Attached {} as {}{}",
        "✓".green(),
        imported.file_name.bright_white(),
        imported.asset_path,
        note
    );
    Ok(())
}

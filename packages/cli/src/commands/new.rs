use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use jotter_editor::{Caret, EditEvent, SaveOutcome};
use jotter_workspace::open_entry;
use std::time::Instant;
use tracing::info;

use super::fail_on_errors;

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Text for the first paragraph
    #[arg(short, long)]
    pub text: Option<String>,
}

pub fn new(args: NewArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let entries = config.entries(cwd);
    let id = entries.create_entry()?;

    if let Some(text) = args.text.filter(|t| !t.is_empty()) {
        let mut session = open_entry(&entries, &id, config.editor.clone())?;
        let first = session.editor().nodes().first().and_then(|n| n.id()).map(str::to_string);
        if let Some(block_id) = first {
            session.editor_mut().set_caret(Caret::text(block_id, 0));
            session.handle_edit(EditEvent::Input(text), Instant::now());
        }
        let outcome = session.save();
        info!(entry = %id, ?outcome, "Saved first paragraph");
        if outcome == SaveOutcome::Failed {
            fail_on_errors(session.take_notifications())?;
        }
    }

    println!("{} Created entry {}", "✓".green(), id.bright_white());
    Ok(())
}

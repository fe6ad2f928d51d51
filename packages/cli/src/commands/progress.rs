use crate::config::Config;
use anyhow::Result;
use clap::Args;
use jotter_common::TaskProgress;
use jotter_model::{load_document, IdGenerator};
use jotter_workspace::EntryStore;

#[derive(Debug, Args)]
pub struct ProgressArgs {
    /// Entry id (all entries when omitted)
    pub entry: Option<String>,
}

pub fn progress(args: ProgressArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let entries = config.entries(cwd);

    match args.entry {
        Some(id) => println!("{}", progress_of(&entries, &id)?),
        None => {
            for id in entries.list_entries()? {
                println!("{}  {}", id, progress_of(&entries, &id)?);
            }
        }
    }
    Ok(())
}

fn progress_of(entries: &EntryStore, id: &str) -> Result<TaskProgress> {
    let content = entries.read_content(id)?;
    let nodes = load_document(&content, &mut IdGenerator::new());
    Ok(TaskProgress::of(&nodes))
}

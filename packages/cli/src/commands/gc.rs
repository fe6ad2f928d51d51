use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use jotter_assets::{collect_garbage, referenced_assets, AssetStore};
use jotter_model::{load_document, IdGenerator};
use tracing::{info, warn};

#[derive(Debug, Args)]
pub struct GcArgs {
    /// Entry id
    pub entry: String,

    /// List orphaned assets without removing them
    #[arg(long)]
    pub dry_run: bool,
}

pub fn gc(args: GcArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let entries = config.entries(cwd);
    let content = entries.read_content(&args.entry)?;
    let store = entries.asset_store(&args.entry)?;
    let nodes = load_document(&content, &mut IdGenerator::new());

    if args.dry_run {
        let referenced = referenced_assets(&nodes);
        let orphans: Vec<String> = store
            .list_assets()?
            .into_iter()
            .filter(|name| !referenced.contains(name))
            .collect();
        info!(entry = %args.entry, orphans = orphans.len(), "Listed orphaned assets");
        for name in &orphans {
            println!("  {} {}", "orphan".yellow(), name);
        }
        println!("{} orphaned asset(s)", orphans.len());
        return Ok(());
    }

    let report = collect_garbage(&store, &nodes)?;
    info!(
        entry = %args.entry,
        kept = report.kept.len(),
        removed = report.removed.len(),
        "Collected garbage"
    );
    if !report.failed.is_empty() {
        warn!(entry = %args.entry, failed = report.failed.len(), "Some assets could not be removed");
    }
    for name in &report.removed {
        println!("  {} {}", "removed".green(), name);
    }
    for name in &report.failed {
        println!("  {} {}", "failed".red(), name);
    }
    println!(
        "{} kept, {} removed, {} failed",
        report.kept.len(),
        report.removed.len(),
        report.failed.len()
    );
    Ok(())
}

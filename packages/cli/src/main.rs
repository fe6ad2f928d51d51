mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    attach, gc, new, progress, show, AttachArgs, GcArgs, NewArgs, ProgressArgs, ShowArgs,
};
use tracing_subscriber::EnvFilter;

/// Jotter - notes with structured rich text and attachments
#[derive(Parser, Debug)]
#[command(name = "jotter")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new entry
    New(NewArgs),

    /// Print an entry as an outline or as surface markup
    Show(ShowArgs),

    /// Attach a file to the end of an entry
    Attach(AttachArgs),

    /// Remove assets no longer referenced by an entry
    Gc(GcArgs),

    /// Show task completion for one or all entries
    Progress(ProgressArgs),
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("JOTTER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();

    match cli.command {
        Command::New(args) => new(args, &cwd),
        Command::Show(args) => show(args, &cwd),
        Command::Attach(args) => attach(args, &cwd),
        Command::Gc(args) => gc(args, &cwd),
        Command::Progress(args) => progress(args, &cwd),
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

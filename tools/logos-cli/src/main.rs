use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

mod project;
mod report;

use project::{LinesFile, Project};

#[derive(Parser)]
#[command(author, version, about = "Interlinear analysis reports and batch approval")]
struct Cli {
    /// Project JSON: writing systems, lexicon and texts.
    #[arg(short, long, value_name = "FILE")]
    project: PathBuf,

    /// Line layout in TOML. Defaults to the standard lines.
    #[arg(short, long, value_name = "FILE")]
    lines: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every word occurrence with its interpretation and guess.
    Report,
    /// Store the guess of every unanalyzed occurrence.
    ApproveAll {
        /// Print the report afterwards.
        #[arg(long)]
        report: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let input = fs::read_to_string(&cli.project)
        .with_context(|| format!("reading {:?}", cli.project))?;
    let project = Project::from_json(&input)?;
    let lines = match &cli.lines {
        Some(path) => {
            let input =
                fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
            Some(LinesFile::from_toml(&input)?)
        }
        None => None,
    };
    let mut loaded = project.build(lines)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Report => {
            for text in &loaded.texts {
                report::write_report(&mut loaded.session, *text, &mut out)?;
            }
        }
        Command::ApproveAll { report } => {
            let mut total = 0;
            for text in &loaded.texts {
                total += loaded.session.approve_all(*text)?;
            }
            info!(texts = loaded.texts.len(), replaced = total, "approve all finished");
            writeln!(out, "{} occurrences approved in {} texts", total, loaded.texts.len())?;
            if report {
                for text in &loaded.texts {
                    report::write_report(&mut loaded.session, *text, &mut out)?;
                }
            }
        }
    }
    Ok(())
}

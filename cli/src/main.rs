mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use kra_core::error::AppError;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "kg-research-agent")]
#[command(version, about = "Evidence-grounded question answering over a local paper corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: ./kg-research-agent.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity: -v info, -vv debug, -vvv trace (RUST_LOG overrides)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add plain-text papers to the corpus (paper id = file stem)
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Embed new or changed chunks
    Index,

    /// Show the chunks closest to a query
    Search {
        query: String,

        /// Number of hits (default: retrieval.top_k)
        #[arg(short = 'k', long = "top-k")]
        k: Option<u32>,
    },

    /// Answer one question with cited evidence
    Ask { question: String },

    /// Interactive session; earlier turns inform the planner
    Chat,

    /// Deduplicate an evidence response JSON file and print the result
    Dedup {
        file: PathBuf,

        /// Similarity threshold in [0, 1] for the fuzzy policy
        #[arg(short, long, conflicts_with = "strict")]
        threshold: Option<f64>,

        /// Drop exact repeats only (normalized claim per chunk)
        #[arg(long)]
        strict: bool,
    },

    /// Evidence previously recorded for questions containing the text
    Ledger { question: String },

    /// Check that Ollama is reachable
    Health,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(data_dir = %config.paths.data_dir.display(), "config loaded");

    match cli.command {
        Commands::Ingest { files } => commands::ingest(&config, &files),
        Commands::Index => commands::index(&config),
        Commands::Search { query, k } => commands::search(&config, &query, k),
        Commands::Ask { question } => commands::ask(&config, &question),
        Commands::Chat => commands::chat(&config),
        Commands::Dedup {
            file,
            threshold,
            strict,
        } => commands::dedup(&config, &file, threshold, strict),
        Commands::Ledger { question } => commands::ledger(&config, &question),
        Commands::Health => commands::health(&config),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        if let Some(details) = e.downcast_ref::<AppError>().and_then(|a| a.details.as_deref()) {
            eprintln!("  details: {details}");
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn dedup_flags_parse() {
        let cli = Cli::try_parse_from(["kg-research-agent", "-vv", "dedup", "ev.json", "--threshold", "0.7"])
            .expect("parse");
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Dedup {
                file,
                threshold,
                strict,
            } => {
                assert_eq!(file, PathBuf::from("ev.json"));
                assert_eq!(threshold, Some(0.7));
                assert!(!strict);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["kg-research-agent", "dedup", "ev.json", "--strict", "--threshold", "0.5"]).is_err());
        assert!(Cli::try_parse_from(["kg-research-agent", "ingest"]).is_err());
    }
}

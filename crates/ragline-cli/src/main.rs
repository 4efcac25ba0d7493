//! Ragline CLI - Ingest documents and answer questions with tool-calling agents.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ragline - Agentic retrieval over your documents
#[derive(Parser)]
#[command(name = "ragline")]
#[command(version)]
#[command(about = "Agentic retrieval-augmented answers over your documents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "RAGLINE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Show declared and live components
    Info,

    /// Ingest sources, then answer questions
    Run {
        /// Skip ingestion and only answer questions
        #[arg(long)]
        skip_ingest: bool,

        /// JSON array of {"path", "name"} entries
        #[arg(short, long, default_value = "sources.json")]
        sources: String,

        /// JSON array of questions
        #[arg(short, long, default_value = "question.json")]
        questions: String,

        /// Ask the assistant directly instead of the manager
        #[arg(long)]
        assistant: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ragline=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ragline=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Init { force } => commands::init::run(config, force),
        Commands::Info => commands::info::run(config),
        Commands::Run {
            skip_ingest,
            sources,
            questions,
            assistant,
        } => commands::run::run(config, skip_ingest, &sources, &questions, !assistant),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

//! Write a default configuration.

use super::config_path;
use anyhow::{Context, Result};
use colored::Colorize;
use ragline_config::Config;
use std::path::Path;

pub fn run(explicit: Option<&Path>, force: bool) -> Result<()> {
    let path = config_path(explicit)?;

    if path.exists() && !force {
        println!("{} Ragline is already initialized.", "Note:".yellow().bold());
        println!("  Config: {}", path.display());
        println!("  Use {} to overwrite it.", "--force".cyan());
        return Ok(());
    }

    println!("{}", "Initializing Ragline...".cyan().bold());

    let config = Config::create_default_file(&path).context("Failed to create config file")?;
    println!("  {} Created config: {}", "✓".green(), path.display());

    println!();
    println!("{}", "Ragline initialized successfully!".green().bold());
    println!();
    println!("Defaults:");
    println!("  Parser:       {}", config.parsers.default);
    println!("  Chunker:      {}", config.chunkers.default);
    println!("  Vector store: {}", config.vector_stores.default);
    println!();
    println!("Next steps:");
    println!("  1. List sources in {}", "sources.json".cyan());
    println!(
        "  2. Put their names in {} (currently {})",
        "agents.manager.config.plans".cyan(),
        config.agents.manager.config["plans"]
    );
    println!("  3. List questions in {}", "question.json".cyan());
    println!("  4. Run: {}", "ragline run".cyan());

    Ok(())
}

//! Show declared and live components.

use super::{build_orchestrator, load_config};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use tokio::runtime::Runtime;

pub fn run(explicit: Option<&Path>) -> Result<()> {
    let config = load_config(explicit)?;
    let orchestrator = build_orchestrator(config)?;

    let rt = Runtime::new().context("Failed to create async runtime")?;
    let info = rt.block_on(orchestrator.system_info());

    println!("{} v{}", info.name.bold(), info.version);
    println!();

    println!("{}", "Declared:".cyan().bold());
    for (family, entry) in [
        ("Parser", &info.declared.parser),
        ("Chunker", &info.declared.chunker),
        ("Vector store", &info.declared.vector_store),
    ] {
        println!("  {:<14} {} ({})", family, entry.name, entry.class);
    }
    println!("  {:<14} {}", "Manager", info.declared.manager);
    println!("  {:<14} {}", "Assistant", info.declared.assistant);
    println!();

    let live = &info.live;
    println!("{}", "Live:".cyan().bold());
    println!(
        "  {:<14} {} ({}) [{}]",
        "Parser",
        live.selection.parser,
        live.parser,
        live.supported_formats.join(", ")
    );
    println!(
        "  {:<14} {} ({}) {}",
        "Chunker", live.selection.chunker, live.chunker, live.chunker_config
    );
    println!(
        "  {:<14} {} ({})",
        "Vector store", live.selection.vector_store, live.store
    );
    println!(
        "  {:<14} {} [{}]",
        "Manager",
        info.live.manager,
        info.live.manager_tools.join(", ")
    );
    println!(
        "  {:<14} {} [{}]",
        "Assistant",
        info.live.assistant,
        info.live.assistant_tools.join(", ")
    );
    println!();

    println!("{}", "Collection:".cyan().bold());
    println!("  {}", serde_json::to_string_pretty(&info.collection)?);

    let drift = info.drift();
    if !drift.is_empty() {
        println!();
        let families: Vec<_> = drift.iter().map(|f| f.to_string()).collect();
        println!(
            "{} live components differ from the configuration: {}",
            "Drift:".yellow().bold(),
            families.join(", ")
        );
    }

    Ok(())
}

//! Batch run: ingest a source list, then answer a question list.

use super::{build_orchestrator, expand_path, load_config};
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use ragline_core::{Parser, SourceRef};
use ragline_pipeline::{Agent, Orchestrator};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::{info, warn};

/// One entry of the sources file.
#[derive(Debug, Deserialize)]
struct SourceEntry {
    path: String,
    name: String,
}

pub fn run(
    explicit: Option<&Path>,
    skip_ingest: bool,
    sources: &str,
    questions: &str,
    use_manager: bool,
) -> Result<()> {
    let config = load_config(explicit)?;
    let orchestrator = build_orchestrator(config)?;
    let rt = Runtime::new().context("Failed to create async runtime")?;

    if skip_ingest {
        info!("Skipping ingestion");
    } else {
        let sources = load_sources(&expand_path(sources), |p| supported(&orchestrator, p))?;
        ingest_all(&rt, &orchestrator, &sources)?;
    }

    let questions = load_questions(&expand_path(questions))?;
    if questions.is_empty() {
        println!("{}", "No questions to answer.".yellow());
        return Ok(());
    }

    let agent = if use_manager {
        orchestrator.manager().name().to_string()
    } else {
        orchestrator.assistant().name().to_string()
    };
    println!("\n{} {} question(s) with {}", "Answering:".cyan(), questions.len(), agent);

    for question in &questions {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.set_message(question.clone());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        let result = rt.block_on(orchestrator.query(question, use_manager));
        pb.finish_and_clear();

        println!("\n{} {}", "Question:".cyan().bold(), question);
        match result {
            Ok(answer) => println!("{} {}", "Answer:".green().bold(), answer.trim()),
            Err(e) => {
                warn!("{}", e);
                println!("{} {}", "Failed:".red().bold(), e);
            }
        }
    }

    Ok(())
}

fn supported(orchestrator: &Orchestrator, path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| orchestrator.parser().supports(e))
        .unwrap_or(false)
}

fn ingest_all(rt: &Runtime, orchestrator: &Orchestrator, sources: &[SourceRef]) -> Result<()> {
    if sources.is_empty() {
        println!("{}", "No supported sources found.".yellow());
        return Ok(());
    }

    println!(
        "{} {} source(s) with {}",
        "Ingesting:".cyan(),
        sources.len(),
        orchestrator.parser().name()
    );

    let pb = ProgressBar::new(sources.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut chunks = 0;
    let mut failed = 0;
    for source in sources {
        let filename = source
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");
        pb.set_message(filename.to_string());

        match rt.block_on(orchestrator.ingest(source)) {
            Ok(ids) => chunks += ids.len(),
            Err(e) => {
                warn!("{}", e);
                failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "{} {} source(s), {} chunk(s)",
        "Ingested:".green().bold(),
        sources.len() - failed,
        chunks
    );
    if failed > 0 {
        println!("{} {} source(s)", "Failed:".red().bold(), failed);
    }
    Ok(())
}

/// Read the sources file, expanding directories to the files `keep` accepts.
fn load_sources(path: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<SourceRef>> {
    let contents = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read sources file {} (use --skip-ingest to skip ingestion)",
            path.display()
        )
    })?;
    let entries: Vec<SourceEntry> = serde_json::from_str(&contents)
        .with_context(|| format!("{} must be a JSON array of {{\"path\", \"name\"}}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut sources = Vec::new();
    for entry in entries {
        let mut target = expand_path(&entry.path);
        if target.is_relative() {
            target = base.join(target);
        }

        if target.is_dir() {
            for file in walk(&target) {
                if keep(&file) {
                    sources.push(SourceRef::new(file, &entry.name));
                }
            }
        } else if target.exists() {
            sources.push(SourceRef::new(target, &entry.name));
        } else {
            warn!("Source not found: {}", target.display());
        }
    }
    Ok(sources)
}

/// Visible files under `dir`, in a stable order.
fn walk(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| {
            // Skip hidden files
            !e.path()
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with('.'))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect()
}

fn load_questions(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read questions file {}", path.display()))?;
    let questions: Vec<String> = serde_json::from_str(&contents)
        .with_context(|| format!("{} must be a JSON array of strings", path.display()))?;
    Ok(questions
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect())
}

//! Status command - show repository, backend and ingestion status

use super::open_session;
use anyhow::Result;
use console::style;
use repochat::ai::LlmBackend;
use repochat::engine::{IngestState, OpenOptions};
use std::path::Path;

fn check(ok: bool) -> console::StyledObject<&'static str> {
    if ok {
        style("[OK]").green()
    } else {
        style("[--]").dim()
    }
}

/// Run the status command
pub fn run(repo: &Path) -> Result<()> {
    let (config, chat) = open_session(
        repo,
        OpenOptions {
            force_local: false,
            use_ai: true,
        },
    )?;

    println!("\nrepochat Status\n");

    if let Some(root) = chat.root() {
        println!("  Repository: {}", style(root.display()).cyan());
    }
    println!("  Backend:    {}", style(chat.store().kind().as_str()).cyan());
    if let Some(snapshot) = chat.snapshot_path() {
        println!("  Snapshot:   {}", style(snapshot.display()).dim());
    }
    println!();

    let state = chat.state();
    println!(
        "  {} Graph {}",
        check(state == IngestState::Ingested),
        state.as_str()
    );
    if state == IngestState::Ingested {
        let stats = chat.stats()?;
        println!(
            "      {} nodes, {} relationships",
            style(stats.total_nodes()).cyan(),
            style(stats.total_relationships()).cyan()
        );
    } else {
        println!("      Run {}", style("repochat ingest").cyan());
    }

    println!();
    println!("  Neo4j:");
    match config.neo4j.uri.as_deref() {
        Some(uri) => println!("    {} NEO4J_URI {}", check(true), style(uri).dim()),
        None => println!("    {} NEO4J_URI (local snapshot store)", check(false)),
    }

    println!();
    println!("  API Keys:");
    for (backend, name) in [
        (LlmBackend::Anthropic, "ANTHROPIC_API_KEY"),
        (LlmBackend::OpenAi, "OPENAI_API_KEY"),
    ] {
        println!("    {} {}", check(config.api_key(backend).is_some()), name);
    }

    if chat.has_llm() {
        println!("    {} LLM questions and prose answers", check(true));
    } else {
        println!("    {} LLM (rule-based answers)", check(false));
    }

    if !config.ai_enabled() {
        println!("\n  AI disabled in config; answers use the built-in rules");
    } else if !config.has_ai_key() {
        println!("\n  Set an API key to enable LLM questions and prose answers");
    }

    println!();
    Ok(())
}

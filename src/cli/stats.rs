//! Stats command - node and relationship counts

use super::open_session;
use anyhow::Result;
use console::style;
use repochat::engine::OpenOptions;
use repochat::graph::{NodeLabel, RelType};
use std::path::Path;

pub fn run(repo: &Path, local: bool) -> Result<()> {
    let (_, chat) = open_session(
        repo,
        OpenOptions {
            force_local: local,
            use_ai: false,
        },
    )?;
    let stats = chat.stats()?;

    println!(
        "\nGraph ({})\n",
        style(chat.store().kind().as_str()).cyan()
    );
    if stats.is_empty() {
        println!("  {} Graph is empty. Run `repochat ingest` first.", style("[--]").dim());
        return Ok(());
    }

    println!("{}", style("Nodes").bold());
    for label in NodeLabel::ALL {
        println!("  {:<14} {}", label.as_str(), stats.node_count(label));
    }
    println!("\n{}", style("Relationships").bold());
    for rel in RelType::ALL {
        println!("  {:<14} {}", rel.as_str(), stats.relationship_count(rel));
    }
    println!(
        "\n  {} nodes, {} relationships",
        stats.total_nodes(),
        stats.total_relationships()
    );
    Ok(())
}

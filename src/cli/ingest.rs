//! Ingest command - extract history and rebuild the graph

use super::open_session;
use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use repochat::engine::OpenOptions;
use repochat::graph::BuildLimits;
use std::path::Path;
use std::time::Instant;

fn create_bar_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")?
        .progress_chars("█▓▒░  "))
}

pub fn run(repo: &Path, max_commits: Option<usize>, local: bool) -> Result<()> {
    let start = Instant::now();
    let (_, mut chat) = open_session(
        repo,
        OpenOptions {
            force_local: local,
            use_ai: false,
        },
    )?;
    if let Some(max_commits) = max_commits {
        let limits = BuildLimits {
            max_commits,
            ..chat.limits()
        };
        chat = chat.with_limits(limits);
    }

    if let Some(root) = chat.root() {
        println!("Ingesting: {}", style(root.display()).cyan());
    }
    println!(
        "Backend:   {}\n",
        style(chat.store().kind().as_str()).cyan()
    );

    let bar = ProgressBar::new(100);
    bar.set_style(create_bar_style()?);
    let mut progress = |percent: u8, message: &str| {
        bar.set_position(u64::from(percent));
        bar.set_message(message.to_string());
    };
    let result = chat.ingest_repository(&mut progress);
    bar.finish_and_clear();
    let stats = result?;

    println!(
        "{} Graph built in {:.1}s",
        style("[OK]").green(),
        start.elapsed().as_secs_f64()
    );
    println!("  Commits:       {}", stats.commits);
    println!("  Contributors:  {}", stats.contributors);
    println!("  Files:         {}", stats.files);
    println!("  Branches:      {}", stats.branches);
    println!("  Tags:          {}", stats.tags);
    println!("  Relationships: {}", stats.relationships);
    if stats.skipped > 0 {
        println!(
            "  {} {} items skipped (run with --log-level debug for details)",
            style("[!!]").yellow(),
            stats.skipped
        );
    }
    if let Some(snapshot) = chat.snapshot_path().filter(|_| stats.persisted) {
        println!("  Snapshot:      {}", style(snapshot.display()).dim());
    }
    Ok(())
}

//! Clean command - remove the repository's graph snapshot

use anyhow::Result;
use repochat::cache::snapshot_path;
use repochat::config::UserConfig;
use repochat::git::GitMetadataExtractor;
use std::path::Path;

pub fn run(repo: &Path, dry_run: bool) -> Result<()> {
    let config = UserConfig::load()?;
    let extractor = GitMetadataExtractor::open(repo)?;
    let snapshot = snapshot_path(&config.cache_root(), extractor.root());

    if !snapshot.exists() {
        println!("No snapshot found for {}.", extractor.root().display());
        return Ok(());
    }

    println!("Found snapshot:");
    println!("  {}", snapshot.display());

    if dry_run {
        println!("\nDry run - nothing removed. Run without --dry-run to delete.");
        return Ok(());
    }

    std::fs::remove_file(&snapshot)?;
    println!("\nRemoved: {}", snapshot.display());
    Ok(())
}

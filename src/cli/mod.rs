//! CLI command definitions and handlers

mod ask;
mod clean;
mod config;
mod ingest;
mod stats;
mod status;

use anyhow::Result;
use clap::{Parser, Subcommand};
use repochat::config::UserConfig;
use repochat::engine::{OpenOptions, RepoChat};
use std::path::{Path, PathBuf};

/// repochat - Chat with your repository history
#[derive(Parser, Debug)]
#[command(name = "repochat")]
#[command(
    version,
    about = "Ask questions about a git repository's history in English or Bengali",
    long_about = "repochat builds a knowledge graph of commits, files, contributors, \
branches and tags, then answers natural-language questions against it.\n\n\
The graph lives in Neo4j when NEO4J_URI is set, otherwise in a local snapshot.",
    after_help = "\
Examples:
  repochat ingest                              Build the graph for the current directory
  repochat --repo ../app ingest --max-commits 200
  repochat ask Who are the top contributors?
  repochat ask \"সাম্প্রতিক কমিট দেখাও\"
  repochat stats                               Node and relationship counts"
)]
pub struct Cli {
    /// Path to repository (default: current directory)
    #[arg(long, global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract repository history and rebuild the knowledge graph
    Ingest {
        /// Maximum commits to sample (overrides config)
        #[arg(long)]
        max_commits: Option<usize>,

        /// Use the local snapshot store even if Neo4j is configured
        #[arg(long)]
        local: bool,
    },

    /// Ask a question about the repository
    #[command(after_help = "\
Examples:
  repochat ask Who are the top contributors?
  repochat ask \"commits by alice\"
  repochat ask --no-ai What are the largest files?")]
    Ask {
        /// The question, in English or Bengali
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Answer with the built-in rules and templates only
        #[arg(long)]
        no_ai: bool,

        /// Use the local snapshot store even if Neo4j is configured
        #[arg(long)]
        local: bool,
    },

    /// Show node and relationship counts
    Stats {
        /// Use the local snapshot store even if Neo4j is configured
        #[arg(long)]
        local: bool,
    },

    /// Show repository, backend and ingestion status
    Status,

    /// Delete this repository's graph snapshot
    Clean {
        /// Show what would be removed without removing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage user configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example ~/.config/repochat/config.toml
    Init,
    /// Print the resolved configuration (secrets masked)
    Show,
}

/// Load the user config and open a session on `repo`.
fn open_session(repo: &Path, options: OpenOptions) -> Result<(UserConfig, RepoChat)> {
    let config = UserConfig::load()?;
    let chat = RepoChat::open(&config, repo, options)?;
    Ok((config, chat))
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ingest { max_commits, local } => ingest::run(&cli.repo, max_commits, local),

        Commands::Ask {
            question,
            no_ai,
            local,
        } => ask::run(&cli.repo, &question.join(" "), !no_ai, local),

        Commands::Stats { local } => stats::run(&cli.repo, local),

        Commands::Status => status::run(&cli.repo),

        Commands::Clean { dry_run } => clean::run(&cli.repo, dry_run),

        Commands::Config { action } => match action {
            ConfigAction::Init => config::init(),
            ConfigAction::Show => config::show(),
        },

        Commands::Version => {
            println!("repochat {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_collects_words() {
        let cli = Cli::try_parse_from(["repochat", "ask", "Who", "are", "the", "top", "contributors?"])
            .unwrap();
        match cli.command {
            Commands::Ask { question, no_ai, .. } => {
                assert_eq!(question.join(" "), "Who are the top contributors?");
                assert!(!no_ai);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.repo, PathBuf::from("."));
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_global_repo_after_subcommand() {
        let cli = Cli::try_parse_from(["repochat", "ingest", "--repo", "/tmp/x", "--max-commits", "10"])
            .unwrap();
        assert_eq!(cli.repo, PathBuf::from("/tmp/x"));
        assert!(matches!(
            cli.command,
            Commands::Ingest {
                max_commits: Some(10),
                local: false
            }
        ));
    }

    #[test]
    fn test_rejects_empty_question_and_bad_level() {
        assert!(Cli::try_parse_from(["repochat", "ask"]).is_err());
        assert!(Cli::try_parse_from(["repochat", "--log-level", "loud", "stats"]).is_err());
    }
}

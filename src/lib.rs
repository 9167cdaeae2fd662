//! repochat - Chat with your repository history
//!
//! Builds a knowledge graph of a git repository (commits, files,
//! contributors, branches, tags) and answers natural-language questions in
//! English or Bengali against it.
//!
//! ```rust,ignore
//! use repochat::config::UserConfig;
//! use repochat::engine::{OpenOptions, RepoChat};
//!
//! let config = UserConfig::load()?;
//! let chat = RepoChat::open(&config, Path::new("."), OpenOptions::default())?;
//! chat.ingest_repository(&mut |_, _| {})?;
//! println!("{}", chat.ask("Who are the top contributors?"));
//! ```

pub mod ai;
pub mod cache;
pub mod config;
pub mod engine;
pub mod errors;
pub mod git;
pub mod graph;
pub mod models;
pub mod query;

pub use engine::{Answer, IngestState, OpenOptions, QueryStage, RepoChat};
pub use errors::{RepoChatError, Result};

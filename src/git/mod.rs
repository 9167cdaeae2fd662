//! Git metadata extraction
//!
//! Reads commits, working-tree files, branches and tags from a local
//! checkout with libgit2 and hands them to the graph builder as plain
//! records.
//!
//! # Example
//!
//! ```no_run
//! use repochat::git::GitMetadataExtractor;
//! use repochat::models::MetadataExtractor;
//! use std::path::Path;
//!
//! let extractor = GitMetadataExtractor::open(Path::new("/path/to/repo"))?
//!     .with_limits(500, 2000);
//! let metadata = extractor.extract_metadata()?;
//! println!("{} commits", metadata.commits.len());
//! # Ok::<(), repochat::errors::RepoChatError>(())
//! ```

pub mod history;

pub use history::GitMetadataExtractor;

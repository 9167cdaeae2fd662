//! On-disk locations for local graph snapshots

pub mod paths;

pub use paths::{default_cache_root, repo_name, sanitize_repo_name, snapshot_path};

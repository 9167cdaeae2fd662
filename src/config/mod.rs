//! Configuration module for repochat
//!
//! This module handles:
//! - User configuration (~/.config/repochat/config.toml)
//! - Environment variable overrides
//! - Remote backend credentials and ingestion caps

mod user_config;

pub use user_config::{
    mask_secret, AiSettings, IngestSettings, Neo4jSettings, StorageSettings, UserConfig,
};

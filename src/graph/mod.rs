//! Repository knowledge graph
//!
//! Two interchangeable backends sit behind [`GraphStore`]: a Neo4j server
//! reached over its HTTP transactional endpoint, and an in-memory store with
//! an atomic JSON snapshot per repository.

pub mod builder;
pub mod query;
pub mod remote;
pub mod schema;
pub mod store;
pub mod store_models;
pub mod traits;

pub use builder::{BuildLimits, BuildStats, GraphBuilder};
pub use query::{Comparison, GraphQuery, HopDirection, Predicate, QueryPlan, RelativeDate};
pub use remote::{Neo4jConfig, Neo4jStore};
pub use store::LocalGraphStore;
pub use store_models::{props, GraphNode, NodeLabel, NodeRef, Properties, RelType, Row};
pub use traits::{BackendKind, GraphStats, GraphStore};

use thiserror::Error;

/// Errors raised by graph backends
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Graph backend unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid graph configuration: {0}")]
    Config(String),

    #[error("Node not found: {0}")]
    MissingNode(String),

    #[error("Unsupported query: {0}")]
    Unsupported(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

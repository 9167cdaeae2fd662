//! Graph store trait shared by the remote and local backends

use super::query::QueryPlan;
use super::store_models::{NodeLabel, NodeRef, Properties, RelType, Row};
use super::GraphError;
use std::collections::BTreeMap;

/// Which kind of backend sits behind a [`GraphStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// External graph database; runs arbitrary read-only Cypher
    Remote,
    /// In-memory store; runs only the constrained query vocabulary
    Local,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Remote => "neo4j",
            BackendKind::Local => "local",
        }
    }
}

/// Node and relationship counts per label/type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub nodes: BTreeMap<String, usize>,
    pub relationships: BTreeMap<String, usize>,
}

impl GraphStats {
    pub fn node_count(&self, label: NodeLabel) -> usize {
        self.nodes.get(label.as_str()).copied().unwrap_or(0)
    }

    pub fn relationship_count(&self, rel: RelType) -> usize {
        self.relationships.get(rel.as_str()).copied().unwrap_or(0)
    }

    pub fn total_nodes(&self) -> usize {
        self.nodes.values().sum()
    }

    pub fn total_relationships(&self) -> usize {
        self.relationships.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_nodes() == 0
    }
}

/// Common interface for graph stores.
///
/// Each call is atomic on its own; nothing wraps a whole build in a
/// transaction. Implementations must be shareable across the ingest thread
/// and the question-answering path.
pub trait GraphStore: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Remove every node and relationship.
    fn clear(&self) -> Result<(), GraphError>;

    /// Create the node or merge `properties` into the existing one with the
    /// same natural key.
    fn upsert_node(
        &self,
        label: NodeLabel,
        key: &str,
        properties: Properties,
    ) -> Result<(), GraphError>;

    /// Fails with [`GraphError::MissingNode`] when either endpoint is absent.
    fn create_relationship(
        &self,
        from: &NodeRef,
        to: &NodeRef,
        rel: RelType,
        properties: Properties,
    ) -> Result<(), GraphError>;

    fn run_query(&self, plan: &QueryPlan) -> Result<Vec<Row>, GraphError>;

    fn stats(&self) -> Result<GraphStats, GraphError>;

    /// Flush state to durable storage, if the backend has any of its own.
    fn persist(&self) -> Result<(), GraphError> {
        Ok(())
    }
}

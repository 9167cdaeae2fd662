//! In-memory graph store with a durable JSON snapshot
//!
//! Nodes live in an insertion-ordered map keyed by an opaque id
//! (`<label>_<key>`), relationships in a plain list. The query interpreter
//! understands only the [`GraphQuery`] shape and fails closed: a query it
//! cannot interpret returns no rows instead of an error, because it backs an
//! interactive answer path.

mod snapshot;
#[cfg(test)]
mod tests;

pub use snapshot::atomic_write;

use super::query::{compare_optional, parse_cypher, Field, GraphQuery, HopDirection, QueryPlan, Side};
use super::store_models::{
    GraphNode, GraphRelationship, NodeLabel, NodeRef, Properties, RelType, Row,
};
use super::traits::{BackendKind, GraphStats, GraphStore};
use super::GraphError;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

/// On-disk and in-memory shape of the graph
#[derive(Debug, Default, Serialize, Deserialize)]
struct GraphState {
    nodes: IndexMap<String, GraphNode>,
    relationships: Vec<GraphRelationship>,
}

/// Dependency-free graph backend
pub struct LocalGraphStore {
    graph: RwLock<GraphState>,
    snapshot_path: Option<PathBuf>,
}

impl LocalGraphStore {
    /// Create an in-memory only store (no persistence)
    pub fn in_memory() -> Self {
        Self {
            graph: RwLock::new(GraphState::default()),
            snapshot_path: None,
        }
    }

    /// Open a store backed by a snapshot file, loading it if present.
    ///
    /// An unreadable snapshot is logged and ignored; the next build
    /// overwrites it.
    pub fn open(snapshot_path: &Path) -> Self {
        let state = if snapshot_path.exists() {
            match Self::load(snapshot_path) {
                Ok(state) => {
                    debug!(
                        "Loaded snapshot {:?}: {} nodes, {} relationships",
                        snapshot_path,
                        state.nodes.len(),
                        state.relationships.len()
                    );
                    state
                }
                Err(e) => {
                    warn!("Ignoring unreadable snapshot {:?}: {}", snapshot_path, e);
                    GraphState::default()
                }
            }
        } else {
            GraphState::default()
        };

        Self {
            graph: RwLock::new(state),
            snapshot_path: Some(snapshot_path.to_path_buf()),
        }
    }

    fn load(path: &Path) -> Result<GraphState, GraphError> {
        let content = std::fs::read(path)?;
        Ok(serde_json::from_slice(&content)?)
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    // ==================== Lock Helpers ====================
    //
    // A poisoned lock means a thread panicked mid-write; the graph may be
    // half-updated and there is nothing a caller could do about it.

    fn read_graph(&self) -> std::sync::RwLockReadGuard<'_, GraphState> {
        self.graph
            .read()
            .expect("graph lock poisoned: a thread panicked while holding this lock")
    }

    fn write_graph(&self) -> std::sync::RwLockWriteGuard<'_, GraphState> {
        self.graph
            .write()
            .expect("graph lock poisoned: a thread panicked while holding this lock")
    }

    /// Write the snapshot atomically. No-op for in-memory stores.
    pub fn save(&self) -> Result<(), GraphError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(&*self.read_graph())?;
        atomic_write(path, &bytes)?;
        debug!("Saved snapshot to {:?} ({} bytes)", path, bytes.len());
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<GraphNode> {
        self.read_graph().nodes.get(id).cloned()
    }

    pub fn node_count(&self) -> usize {
        self.read_graph().nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.read_graph().relationships.len()
    }

    // ==================== Query Interpreter ====================

    /// Run a structured query. Unsupported shapes return no rows.
    pub fn execute(&self, query: &GraphQuery) -> Vec<Row> {
        if !query.is_resolved() {
            debug!("Local store got an unresolved relative date; returning no rows");
            return Vec::new();
        }
        let anchor_pred = query.filter.as_ref().filter(|p| p.side == Side::Anchor);
        let target_pred = query.filter.as_ref().filter(|p| p.side == Side::Target);
        if query.hop.is_none() && target_pred.is_some() {
            return Vec::new();
        }

        let graph = self.read_graph();
        let anchors = graph.nodes.iter().filter(|(_, node)| {
            node.label == query.label && anchor_pred.map_or(true, |p| p.matches(&node.properties))
        });

        let mut results: Vec<&GraphNode> = match &query.hop {
            None => anchors.map(|(_, node)| node).collect(),
            Some(hop) => {
                let anchor_ids: HashSet<&str> = anchors.map(|(id, _)| id.as_str()).collect();
                // Distinct targets, in relationship order
                let mut targets: IndexSet<&str> = IndexSet::new();
                for rel in graph.relationships.iter().filter(|r| r.rel_type == hop.rel) {
                    let (near, far) = match hop.direction {
                        HopDirection::Outgoing => (&rel.from, &rel.to),
                        HopDirection::Incoming => (&rel.to, &rel.from),
                    };
                    if anchor_ids.contains(near.as_str()) {
                        targets.insert(far.as_str());
                    }
                }
                targets
                    .into_iter()
                    .filter_map(|id| graph.nodes.get(id))
                    .filter(|node| {
                        node.label == hop.target
                            && target_pred.map_or(true, |p| p.matches(&node.properties))
                    })
                    .collect()
            }
        };

        // sort_by is stable: ties keep insertion order
        if let Some(order) = &query.order_by {
            results.sort_by(|a, b| {
                let ord = compare_optional(
                    a.properties.get(&order.property),
                    b.properties.get(&order.property),
                );
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }

        results
            .into_iter()
            .map(|node| project(node, &query.fields))
            .collect()
    }
}

fn project(node: &GraphNode, fields: &[Field]) -> Row {
    if fields.is_empty() {
        return node.properties.clone();
    }
    fields
        .iter()
        .map(|f| {
            let value = node.properties.get(&f.property).cloned().unwrap_or(Value::Null);
            (f.alias.clone(), value)
        })
        .collect()
}

impl GraphStore for LocalGraphStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn clear(&self) -> Result<(), GraphError> {
        *self.write_graph() = GraphState::default();
        Ok(())
    }

    fn upsert_node(
        &self,
        label: NodeLabel,
        key: &str,
        mut properties: Properties,
    ) -> Result<(), GraphError> {
        properties.insert(label.key_property().to_string(), Value::from(key));
        let id = NodeRef::new(label, key).id();

        let mut graph = self.write_graph();
        match graph.nodes.get_mut(&id) {
            Some(existing) => existing.properties.extend(properties),
            None => {
                graph.nodes.insert(id, GraphNode { label, properties });
            }
        }
        Ok(())
    }

    fn create_relationship(
        &self,
        from: &NodeRef,
        to: &NodeRef,
        rel: RelType,
        properties: Properties,
    ) -> Result<(), GraphError> {
        let (from_id, to_id) = (from.id(), to.id());

        let mut graph = self.write_graph();
        for id in [&from_id, &to_id] {
            if !graph.nodes.contains_key(id) {
                return Err(GraphError::MissingNode(id.clone()));
            }
        }
        graph.relationships.push(GraphRelationship {
            from: from_id,
            to: to_id,
            rel_type: rel,
            properties,
        });
        Ok(())
    }

    fn run_query(&self, plan: &QueryPlan) -> Result<Vec<Row>, GraphError> {
        match plan {
            QueryPlan::Structured(query) => Ok(self.execute(query)),
            QueryPlan::Cypher(text) => match parse_cypher(text) {
                Some(query) => Ok(self.execute(&query)),
                None => {
                    debug!("Query shape not supported by local store: {}", text);
                    Ok(Vec::new())
                }
            },
        }
    }

    fn stats(&self) -> Result<GraphStats, GraphError> {
        let graph = self.read_graph();
        let mut stats = GraphStats::default();
        for node in graph.nodes.values() {
            *stats.nodes.entry(node.label.as_str().to_string()).or_insert(0) += 1;
        }
        for rel in &graph.relationships {
            *stats
                .relationships
                .entry(rel.rel_type.as_str().to_string())
                .or_insert(0) += 1;
        }
        Ok(stats)
    }

    fn persist(&self) -> Result<(), GraphError> {
        self.save()
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property bag carried by nodes, relationships and result rows.
pub type Properties = serde_json::Map<String, Value>;

/// One result row: column name to value.
pub type Row = Properties;

/// Node labels in the repository graph
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NodeLabel {
    Repository,
    Commit,
    Contributor,
    File,
    Branch,
    Tag,
}

impl NodeLabel {
    pub const ALL: [NodeLabel; 6] = [
        NodeLabel::Repository,
        NodeLabel::Commit,
        NodeLabel::Contributor,
        NodeLabel::File,
        NodeLabel::Branch,
        NodeLabel::Tag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Repository => "Repository",
            NodeLabel::Commit => "Commit",
            NodeLabel::Contributor => "Contributor",
            NodeLabel::File => "File",
            NodeLabel::Branch => "Branch",
            NodeLabel::Tag => "Tag",
        }
    }

    /// Natural key property; upserts merge on it.
    pub fn key_property(&self) -> &'static str {
        match self {
            NodeLabel::Repository => "name",
            NodeLabel::Commit => "hash",
            NodeLabel::Contributor => "email",
            NodeLabel::File => "path",
            NodeLabel::Branch => "name",
            NodeLabel::Tag => "name",
        }
    }

    /// Case-insensitive label lookup.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s))
    }
}

/// Relationship types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RelType {
    #[serde(rename = "AUTHORED")]
    Authored,
    #[serde(rename = "MODIFIED")]
    Modified,
    #[serde(rename = "BELONGS_TO")]
    BelongsTo,
    #[serde(rename = "CONTRIBUTES_TO")]
    ContributesTo,
}

impl RelType {
    pub const ALL: [RelType; 4] = [
        RelType::Authored,
        RelType::Modified,
        RelType::BelongsTo,
        RelType::ContributesTo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelType::Authored => "AUTHORED",
            RelType::Modified => "MODIFIED",
            RelType::BelongsTo => "BELONGS_TO",
            RelType::ContributesTo => "CONTRIBUTES_TO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
    }
}

/// Reference to a node by label and natural key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub label: NodeLabel,
    pub key: String,
}

impl NodeRef {
    pub fn new(label: NodeLabel, key: impl Into<String>) -> Self {
        Self {
            label,
            key: key.into(),
        }
    }

    /// Opaque node id used by the local store and its snapshot.
    pub fn id(&self) -> String {
        format!("{}_{}", self.label.as_str().to_lowercase(), self.key)
    }
}

/// A node in the repository graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphNode {
    #[serde(rename = "type")]
    pub label: NodeLabel,
    pub properties: Properties,
}

impl GraphNode {
    pub fn new(label: NodeLabel) -> Self {
        Self {
            label,
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.properties.get(key).and_then(|v| v.as_i64())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }
}

/// A relationship between two nodes, addressed by node id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphRelationship {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub rel_type: RelType,
    #[serde(default)]
    pub properties: Properties,
}

/// Turn a `json!({...})` literal into a property map.
pub fn props(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        _ => Properties::new(),
    }
}

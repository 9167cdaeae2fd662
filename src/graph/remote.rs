//! Neo4j graph backend
//!
//! Talks to the server's HTTP transactional endpoint
//! (`/db/{database}/tx/commit`), one auto-committed statement per call.
//! Uses ureq (sync HTTP) like the AI client, so no async runtime is needed.
//! `bolt://` and `neo4j://` URIs are mapped to the server's HTTP port.

use super::query::{is_read_only, QueryPlan};
use super::schema;
use super::store_models::{NodeLabel, NodeRef, Properties, RelType, Row};
use super::traits::{BackendKind, GraphStats, GraphStore};
use super::GraphError;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection settings for the remote backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Neo4jConfig {
    pub fn new(uri: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            user: user.into(),
            password: password.into(),
            database: "neo4j".to_string(),
        }
    }
}

/// Graph store backed by a Neo4j server
pub struct Neo4jStore {
    endpoint: String,
    auth_header: String,
    agent: ureq::Agent,
}

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // status codes are mapped below
        .timeout_global(Some(Duration::from_secs(30)))
        .build()
        .new_agent()
}

/// Derive the HTTP transactional endpoint from a connection URI.
pub fn http_endpoint(uri: &str, database: &str) -> Result<String, GraphError> {
    let invalid = || GraphError::Config(format!("invalid Neo4j URI: {uri}"));

    let (scheme, rest) = uri.split_once("://").ok_or_else(invalid)?;
    let authority = rest.split('/').next().unwrap_or_default();
    if authority.is_empty() {
        return Err(invalid());
    }
    let host = authority
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(authority);

    let base = match scheme.to_ascii_lowercase().as_str() {
        "http" | "https" => format!("{}://{}", scheme.to_ascii_lowercase(), authority),
        // Bolt ports do not speak HTTP; use the server's default HTTP(S) port
        "bolt" | "neo4j" => format!("http://{host}:7474"),
        "bolt+s" | "bolt+ssc" | "neo4j+s" | "neo4j+ssc" => format!("https://{host}:7473"),
        _ => return Err(invalid()),
    };
    Ok(format!("{base}/db/{database}/tx/commit"))
}

impl Neo4jStore {
    /// Connect, verify the server answers, and set up constraints/indexes.
    ///
    /// Network failures map to [`GraphError::Unavailable`]; a bad URI,
    /// missing password or rejected credentials to [`GraphError::Config`].
    pub fn connect(config: &Neo4jConfig) -> Result<Self, GraphError> {
        if config.password.is_empty() {
            return Err(GraphError::Config(
                "Neo4j password is not set (NEO4J_PASSWORD)".to_string(),
            ));
        }
        let endpoint = http_endpoint(&config.uri, &config.database)?;
        let token = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", config.user, config.password));

        let store = Self {
            endpoint,
            auth_header: format!("Basic {token}"),
            agent: make_agent(),
        };

        store
            .execute("RETURN 1", &Properties::new())
            .map_err(|e| match e {
                GraphError::Config(msg) => GraphError::Config(msg),
                other => GraphError::Unavailable(other.to_string()),
            })?;
        info!("Connected to Neo4j at {}", store.endpoint);

        store.init_schema();
        Ok(store)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn init_schema(&self) {
        for statement in schema::get_schema_statements() {
            match self.execute(statement, &Properties::new()) {
                Ok(_) => debug!(
                    "Executed schema: {}...",
                    &statement[..statement.len().min(50)]
                ),
                Err(e) => warn!("Schema statement failed: {} - {}", statement, e),
            }
        }
    }

    /// Execute one Cypher statement and return its rows.
    pub fn execute(&self, statement: &str, parameters: &Properties) -> Result<Vec<Row>, GraphError> {
        let body = TxRequest {
            statements: vec![Statement {
                statement,
                parameters,
            }],
        };

        let response = self
            .agent
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("Authorization", &self.auth_header)
            .send_json(&body)
            .map_err(|e| GraphError::Unavailable(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(GraphError::Config(format!(
                "Neo4j rejected the credentials (HTTP {status})"
            )));
        }
        if status >= 400 {
            let error_text = response.into_body().read_to_string().unwrap_or_default();
            return Err(GraphError::Query(format!("HTTP {status}: {error_text}")));
        }

        let tx: TxResponse = response
            .into_body()
            .read_json()
            .map_err(|e| GraphError::Query(format!("unreadable response: {e}")))?;
        rows_from_response(tx)
    }
}

impl GraphStore for Neo4jStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn clear(&self) -> Result<(), GraphError> {
        self.execute("MATCH (n) DETACH DELETE n", &Properties::new())?;
        Ok(())
    }

    fn upsert_node(
        &self,
        label: NodeLabel,
        key: &str,
        mut properties: Properties,
    ) -> Result<(), GraphError> {
        properties.insert(label.key_property().to_string(), Value::from(key));
        let statement = format!(
            "MERGE (n:{} {{{}: $key}}) SET n += $props",
            label.as_str(),
            label.key_property()
        );
        let params = json_params(json!({"key": key, "props": properties}));
        self.execute(&statement, &params)?;
        Ok(())
    }

    fn create_relationship(
        &self,
        from: &NodeRef,
        to: &NodeRef,
        rel: RelType,
        properties: Properties,
    ) -> Result<(), GraphError> {
        let statement = format!(
            "MATCH (a:{} {{{}: $from}}) MATCH (b:{} {{{}: $to}}) \
             CREATE (a)-[r:{}]->(b) SET r = $props RETURN count(r) AS created",
            from.label.as_str(),
            from.label.key_property(),
            to.label.as_str(),
            to.label.key_property(),
            rel.as_str()
        );
        let params = json_params(json!({"from": from.key, "to": to.key, "props": properties}));
        let rows = self.execute(&statement, &params)?;

        let created = rows
            .first()
            .and_then(|r| r.get("created"))
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        if created == 0 {
            return Err(GraphError::MissingNode(format!("{} -> {}", from.id(), to.id())));
        }
        Ok(())
    }

    fn run_query(&self, plan: &QueryPlan) -> Result<Vec<Row>, GraphError> {
        match plan {
            QueryPlan::Structured(query) => {
                let (cypher, params) = query.to_cypher()?;
                self.execute(&cypher, &params)
            }
            QueryPlan::Cypher(text) => {
                if !is_read_only(text) {
                    return Err(GraphError::Unsupported(
                        "only read-only MATCH ... RETURN queries are allowed".to_string(),
                    ));
                }
                self.execute(text, &Properties::new())
            }
        }
    }

    fn stats(&self) -> Result<GraphStats, GraphError> {
        let mut stats = GraphStats::default();
        let empty = Properties::new();

        for row in self.execute("MATCH (n) RETURN labels(n)[0] AS label, count(*) AS count", &empty)? {
            if let (Some(label), Some(count)) = (row_str(&row, "label"), row_count(&row)) {
                stats.nodes.insert(label.to_string(), count);
            }
        }
        for row in self.execute("MATCH ()-[r]->() RETURN type(r) AS type, count(*) AS count", &empty)? {
            if let (Some(rel), Some(count)) = (row_str(&row, "type"), row_count(&row)) {
                stats.relationships.insert(rel.to_string(), count);
            }
        }
        Ok(stats)
    }
}

fn json_params(value: Value) -> Properties {
    super::store_models::props(value)
}

fn row_str<'a>(row: &'a Row, key: &str) -> Option<&'a str> {
    row.get(key).and_then(|v| v.as_str())
}

fn row_count(row: &Row) -> Option<usize> {
    row.get("count").and_then(|v| v.as_u64()).map(|c| c as usize)
}

// Transactional endpoint wire types
#[derive(Serialize)]
struct TxRequest<'a> {
    statements: Vec<Statement<'a>>,
}

#[derive(Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: &'a Properties,
}

#[derive(Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Deserialize)]
struct TxResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Deserialize)]
struct TxError {
    code: String,
    message: String,
}

fn rows_from_response(tx: TxResponse) -> Result<Vec<Row>, GraphError> {
    if let Some(err) = tx.errors.first() {
        return Err(GraphError::Query(format!("{}: {}", err.code, err.message)));
    }
    let Some(result) = tx.results.into_iter().next() else {
        return Ok(Vec::new());
    };

    let columns: Vec<String> = result.columns.iter().map(|c| column_name(c)).collect();
    Ok(result
        .data
        .into_iter()
        .map(|data| {
            // A lone node or map column becomes the row itself
            if let [Value::Object(map)] = data.row.as_slice() {
                return map.clone();
            }
            columns.iter().cloned().zip(data.row).collect()
        })
        .collect())
}

/// `c.name` becomes `name`; anything else is kept as written.
fn column_name(column: &str) -> String {
    let is_ident = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_');
    match column.split_once('.') {
        Some((var, prop)) if is_ident(var) && is_ident(prop) => prop.to_string(),
        _ => column.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_endpoint_mapping() {
        assert_eq!(
            http_endpoint("bolt://localhost:7687", "neo4j").unwrap(),
            "http://localhost:7474/db/neo4j/tx/commit"
        );
        assert_eq!(
            http_endpoint("neo4j+s://graph.example.com", "repos").unwrap(),
            "https://graph.example.com:7473/db/repos/tx/commit"
        );
        assert_eq!(
            http_endpoint("http://10.0.0.5:8474/", "neo4j").unwrap(),
            "http://10.0.0.5:8474/db/neo4j/tx/commit"
        );
        assert!(matches!(
            http_endpoint("localhost:7687", "neo4j"),
            Err(GraphError::Config(_))
        ));
        assert!(matches!(
            http_endpoint("ftp://host", "neo4j"),
            Err(GraphError::Config(_))
        ));
    }

    #[test]
    fn test_rows_flatten_single_node_column() {
        let tx: TxResponse = serde_json::from_value(json!({
            "results": [{
                "columns": ["node"],
                "data": [
                    {"row": [{"name": "alice", "commits": 2}], "meta": [null]},
                    {"row": [{"name": "bob", "commits": 1}], "meta": [null]}
                ]
            }],
            "errors": []
        }))
        .unwrap();

        let rows = rows_from_response(tx).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "alice");
        assert_eq!(rows[1]["commits"], 1);
    }

    #[test]
    fn test_rows_normalize_projected_columns() {
        let tx: TxResponse = serde_json::from_value(json!({
            "results": [{
                "columns": ["c.name", "c.commits", "count(f)"],
                "data": [{"row": ["alice", 2, 7]}]
            }],
            "errors": []
        }))
        .unwrap();

        let rows = rows_from_response(tx).unwrap();
        assert_eq!(rows[0]["name"], "alice");
        assert_eq!(rows[0]["commits"], 2);
        assert_eq!(rows[0]["count(f)"], 7);
    }

    #[test]
    fn test_statement_errors_surface_as_query_errors() {
        let tx: TxResponse = serde_json::from_value(json!({
            "results": [],
            "errors": [{"code": "Neo.ClientError.Statement.SyntaxError", "message": "bad"}]
        }))
        .unwrap();
        assert!(matches!(rows_from_response(tx), Err(GraphError::Query(_))));
    }

    #[test]
    fn test_connect_without_password_is_config_error() {
        let config = Neo4jConfig::new("bolt://localhost:7687", "neo4j", "");
        assert!(matches!(
            Neo4jStore::connect(&config),
            Err(GraphError::Config(_))
        ));
    }

    #[test]
    fn test_unreachable_server_is_unavailable() {
        // Port 1 on loopback refuses connections
        let config = Neo4jConfig::new("http://127.0.0.1:1", "neo4j", "secret");
        assert!(matches!(
            Neo4jStore::connect(&config),
            Err(GraphError::Unavailable(_))
        ));
    }
}

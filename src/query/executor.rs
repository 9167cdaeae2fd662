//! Runs bound queries and types the rows that come back

use super::translator::BoundQuery;
use crate::errors::{RepoChatError, Result};
use crate::graph::{GraphStore, QueryPlan, Row};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributorRow {
    pub name: String,
    pub email: String,
    pub commits: i64,
    pub additions: Option<i64>,
    pub deletions: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitRow {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRow {
    pub path: String,
    pub language: Option<String>,
    pub lines_of_code: Option<i64>,
    pub change_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewRow {
    pub name: String,
    pub active_branch: Option<String>,
    pub total_commits: i64,
    pub file_count: Option<i64>,
    pub contributor_count: Option<i64>,
    pub size_mb: Option<f64>,
    pub branches: usize,
    pub tags: usize,
}

/// One result row, typed by which properties it carries
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultRow {
    Contributor(ContributorRow),
    Commit(CommitRow),
    File(FileRow),
    Overview(OverviewRow),
    Generic { fields: Row },
}

fn text(row: &Row, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn int(row: &Row, key: &str) -> Option<i64> {
    row.get(key).and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
}

fn list_len(row: &Row, key: &str) -> usize {
    row.get(key)
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0)
}

impl ResultRow {
    /// Decide the row kind from the properties present.
    ///
    /// Repository nodes carry `total_commits`, commits a `hash`,
    /// contributors an `email` (or a name with a commit count) and files a
    /// `path`. Anything else is listed as key/value pairs.
    pub fn classify(row: Row) -> ResultRow {
        if let Some(total_commits) = int(&row, "total_commits") {
            return ResultRow::Overview(OverviewRow {
                name: text(&row, "name").unwrap_or_else(|| "Unknown".to_string()),
                active_branch: text(&row, "active_branch"),
                total_commits,
                file_count: int(&row, "file_count"),
                contributor_count: int(&row, "contributor_count"),
                size_mb: row.get("size_mb").and_then(Value::as_f64),
                branches: list_len(&row, "branches"),
                tags: list_len(&row, "tags"),
            });
        }
        if let Some(hash) = text(&row, "hash") {
            return ResultRow::Commit(CommitRow {
                hash,
                message: text(&row, "message").unwrap_or_default(),
                author: text(&row, "author_name")
                    .or_else(|| text(&row, "author"))
                    .unwrap_or_else(|| "Unknown".to_string()),
                date: text(&row, "date").unwrap_or_default(),
            });
        }
        let has_email = row.contains_key("email");
        if has_email || (row.contains_key("name") && row.contains_key("commits")) {
            return ResultRow::Contributor(ContributorRow {
                name: text(&row, "name").unwrap_or_else(|| "Unknown".to_string()),
                email: text(&row, "email").unwrap_or_default(),
                commits: int(&row, "commits").unwrap_or(0),
                additions: int(&row, "total_additions"),
                deletions: int(&row, "total_deletions"),
            });
        }
        if let Some(path) = text(&row, "path") {
            return ResultRow::File(FileRow {
                path,
                language: text(&row, "language"),
                lines_of_code: int(&row, "lines_of_code"),
                change_count: int(&row, "change_count"),
            });
        }
        ResultRow::Generic { fields: row }
    }
}

/// Runs bound queries against the session's store
pub struct QueryExecutor {
    store: Arc<dyn GraphStore>,
    today: Option<NaiveDate>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store, today: None }
    }

    /// Pin "today" for relative date resolution.
    pub fn with_today(mut self, today: Option<NaiveDate>) -> Self {
        self.today = today;
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn execute(&self, bound: &BoundQuery) -> Result<Vec<ResultRow>> {
        let plan = match &bound.plan {
            QueryPlan::Structured(query) if !query.is_resolved() => {
                QueryPlan::Structured(query.resolve(self.today()))
            }
            other => other.clone(),
        };
        debug!("Executing on {}: {}", self.store.kind().as_str(), plan.describe());

        let rows = self.store.run_query(&plan).map_err(RepoChatError::from)?;
        Ok(rows.into_iter().map(ResultRow::classify).collect())
    }
}

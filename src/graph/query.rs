//! Structured query representation shared by both backends
//!
//! A [`GraphQuery`] is deliberately small: one label, at most one hop across
//! a named relationship, at most one predicate, one ORDER BY property and a
//! LIMIT. The local store interprets it directly; the remote backend renders
//! it to Cypher with [`GraphQuery::to_cypher`].
//!
//! [`parse_cypher`] accepts the same vocabulary written as Cypher text, which
//! is how LLM-generated queries reach the local store. Anything outside the
//! vocabulary parses to `None`.

use super::store_models::{NodeLabel, Properties, RelType};
use super::GraphError;
use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Comparison operator of a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    /// Case-insensitive substring match
    Contains,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Contains => "CONTAINS",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "=" => Some(Comparison::Eq),
            "CONTAINS" => Some(Comparison::Contains),
            ">" => Some(Comparison::Gt),
            ">=" => Some(Comparison::Gte),
            "<" => Some(Comparison::Lt),
            "<=" => Some(Comparison::Lte),
            _ => None,
        }
    }
}

/// Calendar period named in a question, resolved against "today" only when
/// the query runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDate {
    Today,
    ThisWeek,
    ThisMonth,
}

impl RelativeDate {
    /// First day of the period containing `today`. Weeks start on Monday.
    pub fn start(&self, today: NaiveDate) -> NaiveDate {
        match self {
            RelativeDate::Today => today,
            RelativeDate::ThisWeek => {
                today - Duration::days(today.weekday().num_days_from_monday() as i64)
            }
            RelativeDate::ThisMonth => {
                NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredicateValue {
    Literal(Value),
    Relative(RelativeDate),
}

/// Which node of the pattern a predicate looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Anchor,
    Target,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub side: Side,
    pub property: String,
    pub op: Comparison,
    pub value: PredicateValue,
}

impl Predicate {
    pub fn new(property: &str, op: Comparison, value: impl Into<Value>) -> Self {
        Self {
            side: Side::Anchor,
            property: property.to_string(),
            op,
            value: PredicateValue::Literal(value.into()),
        }
    }

    pub fn since(property: &str, period: RelativeDate) -> Self {
        Self {
            side: Side::Anchor,
            property: property.to_string(),
            op: Comparison::Gte,
            value: PredicateValue::Relative(period),
        }
    }

    pub fn on_target(mut self) -> Self {
        self.side = Side::Target;
        self
    }

    /// Evaluate against a node's properties. Unresolved relative dates and
    /// missing properties never match.
    pub fn matches(&self, properties: &Properties) -> bool {
        let PredicateValue::Literal(expected) = &self.value else {
            return false;
        };
        let Some(actual) = properties.get(&self.property) else {
            return false;
        };

        match self.op {
            Comparison::Contains => {
                let needle = value_text(expected).to_lowercase();
                value_text(actual).to_lowercase().contains(&needle)
            }
            Comparison::Eq => values_equal(actual, expected),
            op => match compare_values(actual, expected) {
                Some(ord) => match op {
                    Comparison::Gt => ord == Ordering::Greater,
                    Comparison::Gte => ord != Ordering::Less,
                    Comparison::Lt => ord == Ordering::Less,
                    Comparison::Lte => ord != Ordering::Greater,
                    _ => false,
                },
                None => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopDirection {
    /// `(anchor)-[:REL]->(target)`
    Outgoing,
    /// `(anchor)<-[:REL]-(target)`
    Incoming,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hop {
    pub rel: RelType,
    pub target: NodeLabel,
    pub direction: HopDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub property: String,
    pub descending: bool,
}

/// Projected column of the returned node
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub property: String,
    pub alias: String,
}

/// The constrained query shape understood by every backend.
///
/// Results are the distinct nodes at the end of the pattern: the target of
/// the hop when there is one, otherwise the anchor. ORDER BY applies to the
/// returned node.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQuery {
    pub label: NodeLabel,
    pub hop: Option<Hop>,
    pub filter: Option<Predicate>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
    /// Empty means "the whole node"
    pub fields: Vec<Field>,
}

impl GraphQuery {
    pub fn new(label: NodeLabel) -> Self {
        Self {
            label,
            hop: None,
            filter: None,
            order_by: None,
            limit: None,
            fields: Vec::new(),
        }
    }

    pub fn hop(mut self, rel: RelType, target: NodeLabel, direction: HopDirection) -> Self {
        self.hop = Some(Hop {
            rel,
            target,
            direction,
        });
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(predicate);
        self
    }

    pub fn order_by(mut self, property: &str, descending: bool) -> Self {
        self.order_by = Some(OrderBy {
            property: property.to_string(),
            descending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Label of the nodes this query returns.
    pub fn returned_label(&self) -> NodeLabel {
        self.hop.as_ref().map(|h| h.target).unwrap_or(self.label)
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(
            self.filter,
            Some(Predicate {
                value: PredicateValue::Relative(_),
                ..
            })
        )
    }

    /// Replace relative dates with absolute `YYYY-MM-DD` literals.
    pub fn resolve(&self, today: NaiveDate) -> GraphQuery {
        let mut resolved = self.clone();
        if let Some(pred) = resolved.filter.as_mut() {
            if let PredicateValue::Relative(period) = pred.value {
                let start = period.start(today).format("%Y-%m-%d").to_string();
                pred.value = PredicateValue::Literal(Value::String(start));
            }
        }
        resolved
    }

    /// Render as a parameterized Cypher statement.
    pub fn to_cypher(&self) -> Result<(String, Properties), GraphError> {
        let mut params = Properties::new();
        let mut cypher = format!("MATCH (n:{})", self.label.as_str());

        if let Some(hop) = &self.hop {
            let pattern = match hop.direction {
                HopDirection::Outgoing => format!("-[:{}]->", hop.rel.as_str()),
                HopDirection::Incoming => format!("<-[:{}]-", hop.rel.as_str()),
            };
            cypher.push_str(&format!("{}(m:{})", pattern, hop.target.as_str()));
        }

        if let Some(pred) = &self.filter {
            let var = match (pred.side, &self.hop) {
                (Side::Anchor, _) => "n",
                (Side::Target, Some(_)) => "m",
                (Side::Target, None) => {
                    return Err(GraphError::Unsupported(
                        "target predicate without a hop".to_string(),
                    ))
                }
            };
            let PredicateValue::Literal(value) = &pred.value else {
                return Err(GraphError::Unsupported(
                    "unresolved relative date".to_string(),
                ));
            };
            let property = identifier(&pred.property)?;
            params.insert("value".to_string(), value.clone());

            let clause = match pred.op {
                Comparison::Contains => format!(
                    "toLower(toString({var}.{property})) CONTAINS toLower($value)"
                ),
                op => format!("{var}.{property} {} $value", op.symbol()),
            };
            cypher.push_str(&format!(" WHERE {clause}"));
        }

        let ret = if self.hop.is_some() { "m" } else { "n" };
        cypher.push_str(&format!(" WITH DISTINCT {ret}"));

        if let Some(order) = &self.order_by {
            cypher.push_str(&format!(
                " ORDER BY {ret}.{} {}",
                identifier(&order.property)?,
                if order.descending { "DESC" } else { "ASC" }
            ));
        }
        if let Some(limit) = self.limit {
            cypher.push_str(&format!(" LIMIT {limit}"));
        }

        if self.fields.is_empty() {
            cypher.push_str(&format!(" RETURN properties({ret}) AS node"));
        } else {
            let columns = self
                .fields
                .iter()
                .map(|f| {
                    Ok(format!(
                        "{ret}.{} AS {}",
                        identifier(&f.property)?,
                        identifier(&f.alias)?
                    ))
                })
                .collect::<Result<Vec<_>, GraphError>>()?;
            cypher.push_str(&format!(" RETURN {}", columns.join(", ")));
        }

        Ok((cypher, params))
    }
}

/// What a backend is asked to run
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPlan {
    Structured(GraphQuery),
    /// Raw Cypher text; only the remote backend runs it verbatim
    Cypher(String),
}

impl QueryPlan {
    pub fn describe(&self) -> String {
        match self {
            QueryPlan::Structured(q) => match q.to_cypher() {
                Ok((cypher, _)) => cypher,
                Err(_) => format!("{q:?}"),
            },
            QueryPlan::Cypher(text) => text.clone(),
        }
    }
}

fn identifier(s: &str) -> Result<&str, GraphError> {
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(s)
    } else {
        Err(GraphError::Unsupported(format!("invalid identifier: {s}")))
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Ordering between two property values: numbers numerically, strings
/// lexicographically (RFC 3339 dates sort correctly), booleans false < true.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Sort key comparison where a missing value sorts before any present one.
pub fn compare_optional(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
    }
}

const WRITE_KEYWORDS: &[&str] = &[
    "CREATE", "MERGE", "DELETE", "DETACH", "SET", "REMOVE", "DROP", "CALL", "LOAD", "FOREACH",
];

/// Whether a Cypher string is a single read-only `MATCH ... RETURN` query.
pub fn is_read_only(cypher: &str) -> bool {
    let upper = cypher.trim().to_ascii_uppercase();
    if !upper.starts_with("MATCH") || !upper.contains("RETURN") {
        return false;
    }
    if upper.trim_end_matches(';').contains(';') {
        return false;
    }
    !upper
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .any(|word| WRITE_KEYWORDS.contains(&word))
}

fn cypher_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?is)^\s*MATCH\s*\(\s*(?P<a>\w+)\s*:\s*(?P<al>\w+)\s*\)(?:\s*(?P<lt><)?-\s*\[\s*\w*\s*:\s*(?P<rel>\w+)\s*\]\s*-(?P<gt>>)?\s*\(\s*(?P<b>\w+)\s*:\s*(?P<bl>\w+)\s*\))?(?:\s+WHERE\s+(?P<wv>\w+)\.(?P<wp>\w+)\s*(?P<op>>=|<=|=|>|<|CONTAINS)\s*(?P<val>'[^']*'|"[^"]*"|-?\d+(?:\.\d+)?|true|false))?\s+RETURN\s+(?P<ret>.+?)(?:\s+ORDER\s+BY\s+(?P<ov>\w+)(?:\.(?P<oprop>\w+))?(?:\s+(?P<dir>ASC|DESC))?)?(?:\s+LIMIT\s+(?P<limit>\d+))?\s*;?\s*$"#,
        )
        .expect("valid regex")
    })
}

fn return_item_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?P<var>\w+)(?:\.(?P<prop>\w+)(?:\s+AS\s+(?P<alias>\w+))?|\s*\{\s*\.\*\s*\})?$")
            .expect("valid regex")
    })
}

fn parse_literal(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    if raw.len() >= 2
        && ((raw.starts_with('\'') && raw.ends_with('\''))
            || (raw.starts_with('"') && raw.ends_with('"')))
    {
        return Some(Value::String(raw[1..raw.len() - 1].to_string()));
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => {}
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Some(Value::from(i));
    }
    raw.parse::<f64>().ok().map(Value::from)
}

/// Parse Cypher text in the constrained vocabulary into a [`GraphQuery`].
///
/// Returns `None` for anything else: multiple hops, several predicates,
/// aggregations, write clauses, unknown labels or relationship types.
pub fn parse_cypher(cypher: &str) -> Option<GraphQuery> {
    let caps = cypher_regex().captures(cypher)?;

    let anchor_var = caps.name("a")?.as_str();
    let mut query = GraphQuery::new(NodeLabel::parse(caps.name("al")?.as_str())?);

    let mut target_var = None;
    if let Some(rel) = caps.name("rel") {
        let direction = match (caps.name("lt").is_some(), caps.name("gt").is_some()) {
            (false, true) => HopDirection::Outgoing,
            (true, false) => HopDirection::Incoming,
            _ => return None,
        };
        let var = caps.name("b")?.as_str();
        if var == anchor_var {
            return None;
        }
        target_var = Some(var);
        query = query.hop(
            RelType::parse(rel.as_str())?,
            NodeLabel::parse(caps.name("bl")?.as_str())?,
            direction,
        );
    }
    let returned_var = target_var.unwrap_or(anchor_var);

    if let Some(wv) = caps.name("wv") {
        let side = if wv.as_str() == anchor_var {
            Side::Anchor
        } else if Some(wv.as_str()) == target_var {
            Side::Target
        } else {
            return None;
        };
        let op = Comparison::parse(caps.name("op")?.as_str())?;
        let value = parse_literal(caps.name("val")?.as_str())?;
        let mut pred = Predicate::new(caps.name("wp")?.as_str(), op, value);
        pred.side = side;
        query = query.filter(pred);
    }

    let ret = caps.name("ret")?.as_str().trim();
    let ret = ret
        .strip_prefix("DISTINCT ")
        .or_else(|| ret.strip_prefix("distinct "))
        .unwrap_or(ret);
    let mut whole_node = false;
    for item in ret.split(',') {
        let item_caps = return_item_regex().captures(item.trim())?;
        if &item_caps["var"] != returned_var {
            return None;
        }
        match item_caps.name("prop") {
            Some(prop) => {
                let alias = item_caps
                    .name("alias")
                    .map(|a| a.as_str())
                    .unwrap_or(prop.as_str());
                query.fields.push(Field {
                    property: prop.as_str().to_string(),
                    alias: alias.to_string(),
                });
            }
            None => whole_node = true,
        }
    }
    if whole_node && !query.fields.is_empty() {
        return None;
    }

    if let Some(ov) = caps.name("ov") {
        let property = match caps.name("oprop") {
            Some(prop) if ov.as_str() == returned_var => prop.as_str().to_string(),
            Some(_) => return None,
            // Bare name: a projected alias or the property itself
            None => query
                .fields
                .iter()
                .find(|f| f.alias == ov.as_str())
                .map(|f| f.property.clone())
                .unwrap_or_else(|| ov.as_str().to_string()),
        };
        let descending = caps
            .name("dir")
            .is_some_and(|d| d.as_str().eq_ignore_ascii_case("DESC"));
        query = query.order_by(&property, descending);
    }

    if let Some(limit) = caps.name("limit") {
        query = query.limit(limit.as_str().parse().ok()?);
    }

    Some(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::store_models::props;
    use serde_json::json;

    #[test]
    fn test_relative_date_periods() {
        // Thursday
        let today = NaiveDate::from_ymd_opt(2024, 5, 16).unwrap();
        assert_eq!(RelativeDate::Today.start(today), today);
        assert_eq!(
            RelativeDate::ThisWeek.start(today),
            NaiveDate::from_ymd_opt(2024, 5, 13).unwrap()
        );
        assert_eq!(
            RelativeDate::ThisMonth.start(today),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
    }

    #[test]
    fn test_resolve_replaces_relative_date() {
        let q = GraphQuery::new(NodeLabel::Commit).filter(Predicate::since("date", RelativeDate::ThisMonth));
        assert!(!q.is_resolved());

        let resolved = q.resolve(NaiveDate::from_ymd_opt(2024, 5, 16).unwrap());
        assert!(resolved.is_resolved());
        assert_eq!(
            resolved.filter.unwrap().value,
            PredicateValue::Literal(json!("2024-05-01"))
        );
    }

    #[test]
    fn test_predicate_matching() {
        let node = props(json!({"name": "Rakib Hasan", "commits": 5, "date": "2024-05-02T10:00:00+00:00"}));

        assert!(Predicate::new("name", Comparison::Contains, "rakib").matches(&node));
        assert!(!Predicate::new("name", Comparison::Contains, "john").matches(&node));
        assert!(Predicate::new("commits", Comparison::Gt, 3).matches(&node));
        assert!(Predicate::new("commits", Comparison::Eq, 5.0).matches(&node));
        assert!(!Predicate::new("commits", Comparison::Lt, 5).matches(&node));
        assert!(Predicate::new("date", Comparison::Gte, "2024-05-01").matches(&node));
        assert!(!Predicate::new("missing", Comparison::Eq, 1).matches(&node));
        assert!(!Predicate::since("date", RelativeDate::Today).matches(&node));
    }

    #[test]
    fn test_to_cypher_single_label() {
        let q = GraphQuery::new(NodeLabel::Contributor)
            .order_by("commits", true)
            .limit(5);
        let (cypher, params) = q.to_cypher().unwrap();
        assert_eq!(
            cypher,
            "MATCH (n:Contributor) WITH DISTINCT n ORDER BY n.commits DESC LIMIT 5 RETURN properties(n) AS node"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_to_cypher_hop_with_contains() {
        let q = GraphQuery::new(NodeLabel::Contributor)
            .hop(RelType::Authored, NodeLabel::Commit, HopDirection::Outgoing)
            .filter(Predicate::new("name", Comparison::Contains, "alice"))
            .order_by("date", true);
        let (cypher, params) = q.to_cypher().unwrap();
        assert_eq!(
            cypher,
            "MATCH (n:Contributor)-[:AUTHORED]->(m:Commit) WHERE toLower(toString(n.name)) CONTAINS toLower($value) WITH DISTINCT m ORDER BY m.date DESC RETURN properties(m) AS node"
        );
        assert_eq!(params["value"], json!("alice"));
    }

    #[test]
    fn test_to_cypher_rejects_unresolved_and_bad_identifiers() {
        let q = GraphQuery::new(NodeLabel::Commit).filter(Predicate::since("date", RelativeDate::Today));
        assert!(matches!(q.to_cypher(), Err(GraphError::Unsupported(_))));

        let q = GraphQuery::new(NodeLabel::Commit).order_by("date) DETACH DELETE (x", false);
        assert!(matches!(q.to_cypher(), Err(GraphError::Unsupported(_))));
    }

    #[test]
    fn test_parse_supported_shapes() {
        let q = parse_cypher(
            "MATCH (c:Contributor) RETURN c.name, c.commits ORDER BY c.commits DESC LIMIT 3",
        )
        .unwrap();
        assert_eq!(q.label, NodeLabel::Contributor);
        assert_eq!(q.limit, Some(3));
        assert_eq!(q.order_by.as_ref().unwrap().property, "commits");
        assert!(q.order_by.as_ref().unwrap().descending);
        assert_eq!(q.fields.len(), 2);

        let q = parse_cypher(
            "MATCH (c:Commit) WHERE c.message CONTAINS 'login' RETURN c ORDER BY c.date DESC LIMIT 10;",
        )
        .unwrap();
        let pred = q.filter.unwrap();
        assert_eq!(pred.op, Comparison::Contains);
        assert_eq!(pred.value, PredicateValue::Literal(json!("login")));
        assert!(q.fields.is_empty());

        let q = parse_cypher(
            "match (a:Contributor)-[:AUTHORED]->(c:Commit) where a.email = \"bob@x.com\" return c",
        )
        .unwrap();
        assert_eq!(q.returned_label(), NodeLabel::Commit);
        assert_eq!(q.filter.unwrap().side, Side::Anchor);

        let q = parse_cypher("MATCH (f:File)<-[:MODIFIED]-(c:Commit) WHERE c.is_bug_fix = true RETURN c")
            .unwrap();
        assert_eq!(q.returned_label(), NodeLabel::Commit);
        assert_eq!(q.hop.unwrap().direction, HopDirection::Incoming);
        assert_eq!(q.filter.unwrap().side, Side::Target);

        let q = parse_cypher(
            "MATCH (c:Contributor) RETURN c.name AS author, c.commits AS total ORDER BY total DESC",
        )
        .unwrap();
        assert_eq!(q.order_by.unwrap().property, "commits");
    }

    #[test]
    fn test_parse_rejects_unsupported_shapes() {
        // aggregation
        assert!(parse_cypher("MATCH (c:Commit) RETURN count(c)").is_none());
        // two predicates
        assert!(parse_cypher(
            "MATCH (c:Commit) WHERE c.additions > 5 AND c.deletions > 5 RETURN c"
        )
        .is_none());
        // two hops
        assert!(parse_cypher(
            "MATCH (a:Contributor)-[:AUTHORED]->(c:Commit)-[:MODIFIED]->(f:File) RETURN f"
        )
        .is_none());
        // unknown label
        assert!(parse_cypher("MATCH (f:Function) RETURN f").is_none());
        // undirected
        assert!(parse_cypher("MATCH (a:Contributor)-[:AUTHORED]-(c:Commit) RETURN c").is_none());
        // returns the anchor of a hop
        assert!(parse_cypher("MATCH (a:Contributor)-[:AUTHORED]->(c:Commit) RETURN a").is_none());
        // writes
        assert!(parse_cypher("MATCH (n:Commit) DETACH DELETE n").is_none());
    }

    #[test]
    fn test_read_only_validation() {
        assert!(is_read_only("MATCH (c:Commit) RETURN c LIMIT 5"));
        assert!(!is_read_only("MATCH (c:Commit) DETACH DELETE c RETURN 1"));
        assert!(!is_read_only("MATCH (c:Commit) SET c.x = 1 RETURN c"));
        assert!(!is_read_only("CREATE (c:Commit) RETURN c"));
        assert!(!is_read_only("MATCH (c:Commit) RETURN c; MATCH (n) DELETE n"));
        // property names containing a keyword are fine
        assert!(is_read_only("MATCH (c:Commit) RETURN c.offset_set"));
    }
}

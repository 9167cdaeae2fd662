use super::*;
use crate::graph::query::{Comparison, Predicate};
use crate::graph::store_models::props;
use serde_json::json;
use tempfile::tempdir;

fn contributor(store: &LocalGraphStore, name: &str, email: &str, commits: i64) {
    store
        .upsert_node(
            NodeLabel::Contributor,
            email,
            props(json!({"name": name, "commits": commits})),
        )
        .expect("upsert contributor");
}

#[test]
fn test_upsert_merges_on_natural_key() {
    let store = LocalGraphStore::in_memory();
    contributor(&store, "Alice", "alice@x.com", 1);
    contributor(&store, "Alice Smith", "alice@x.com", 2);

    assert_eq!(store.node_count(), 1);
    let node = store.node("contributor_alice@x.com").unwrap();
    assert_eq!(node.get_str("name"), Some("Alice Smith"));
    assert_eq!(node.get_i64("commits"), Some(2));
    assert_eq!(node.get_str("email"), Some("alice@x.com"));
}

#[test]
fn test_relationship_requires_both_endpoints() {
    let store = LocalGraphStore::in_memory();
    contributor(&store, "Alice", "alice@x.com", 1);

    let err = store
        .create_relationship(
            &NodeRef::new(NodeLabel::Contributor, "alice@x.com"),
            &NodeRef::new(NodeLabel::Commit, "abc"),
            RelType::Authored,
            Properties::new(),
        )
        .unwrap_err();
    assert!(matches!(err, GraphError::MissingNode(id) if id == "commit_abc"));
    assert_eq!(store.relationship_count(), 0);
}

#[test]
fn test_order_by_desc_limit_keeps_insertion_order_on_ties() {
    let store = LocalGraphStore::in_memory();
    contributor(&store, "A", "a@x.com", 5);
    contributor(&store, "B", "b@x.com", 3);
    contributor(&store, "C", "c@x.com", 3);
    contributor(&store, "D", "d@x.com", 1);

    let rows = store.execute(
        &GraphQuery::new(NodeLabel::Contributor)
            .order_by("commits", true)
            .limit(3),
    );

    let commits: Vec<i64> = rows.iter().map(|r| r["commits"].as_i64().unwrap()).collect();
    assert_eq!(commits, vec![5, 3, 3]);
    let names: Vec<&str> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}

#[test]
fn test_contains_is_case_insensitive() {
    let store = LocalGraphStore::in_memory();
    contributor(&store, "Rakib Hasan", "rakib@x.com", 4);
    contributor(&store, "John Doe", "john@x.com", 2);

    let rows = store.execute(
        &GraphQuery::new(NodeLabel::Contributor)
            .filter(Predicate::new("name", Comparison::Contains, "rakib")),
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Rakib Hasan");
}

#[test]
fn test_single_hop_returns_distinct_targets() {
    let store = LocalGraphStore::in_memory();
    contributor(&store, "Alice", "alice@x.com", 2);
    contributor(&store, "Bob", "bob@x.com", 1);
    for (hash, date) in [("c1", "2024-01-01"), ("c2", "2024-01-03"), ("c3", "2024-01-02")] {
        store
            .upsert_node(NodeLabel::Commit, hash, props(json!({"date": date})))
            .unwrap();
    }
    let authored = [("alice@x.com", "c1"), ("bob@x.com", "c2"), ("alice@x.com", "c3")];
    for (email, hash) in authored {
        store
            .create_relationship(
                &NodeRef::new(NodeLabel::Contributor, email),
                &NodeRef::new(NodeLabel::Commit, hash),
                RelType::Authored,
                Properties::new(),
            )
            .unwrap();
    }

    let rows = store.execute(
        &GraphQuery::new(NodeLabel::Contributor)
            .hop(RelType::Authored, NodeLabel::Commit, HopDirection::Outgoing)
            .filter(Predicate::new("name", Comparison::Contains, "alice"))
            .order_by("date", true),
    );
    let hashes: Vec<&str> = rows.iter().map(|r| r["hash"].as_str().unwrap()).collect();
    assert_eq!(hashes, vec!["c3", "c1"]);

    // Incoming: who authored c2
    let rows = store.execute(
        &GraphQuery::new(NodeLabel::Commit)
            .hop(RelType::Authored, NodeLabel::Contributor, HopDirection::Incoming)
            .filter(Predicate::new("hash", Comparison::Eq, "c2")),
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["email"], "bob@x.com");
}

#[test]
fn test_unsupported_shapes_fail_closed() {
    let store = LocalGraphStore::in_memory();
    contributor(&store, "Alice", "alice@x.com", 2);

    let rows = store
        .run_query(&QueryPlan::Cypher(
            "MATCH (c:Contributor) RETURN count(c) AS total".to_string(),
        ))
        .unwrap();
    assert!(rows.is_empty());

    let rows = store
        .run_query(&QueryPlan::Cypher(
            "MATCH (c:Contributor) WHERE c.commits > 1 RETURN c.name AS name".to_string(),
        ))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Alice");
    assert_eq!(rows[0].len(), 1);

    // predicate on a target with no hop
    let rows = store.execute(
        &GraphQuery::new(NodeLabel::Contributor)
            .filter(Predicate::new("name", Comparison::Eq, "Alice").on_target()),
    );
    assert!(rows.is_empty());
}

#[test]
fn test_stats_and_clear() {
    let store = LocalGraphStore::in_memory();
    contributor(&store, "Alice", "alice@x.com", 2);
    store
        .upsert_node(NodeLabel::Repository, "demo", Properties::new())
        .unwrap();
    store
        .create_relationship(
            &NodeRef::new(NodeLabel::Contributor, "alice@x.com"),
            &NodeRef::new(NodeLabel::Repository, "demo"),
            RelType::ContributesTo,
            Properties::new(),
        )
        .unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.node_count(NodeLabel::Contributor), 1);
    assert_eq!(stats.node_count(NodeLabel::Repository), 1);
    assert_eq!(stats.relationship_count(RelType::ContributesTo), 1);

    store.clear().unwrap();
    assert!(store.stats().unwrap().is_empty());
    assert_eq!(store.relationship_count(), 0);
}

#[test]
fn test_persistence() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("graphs").join("demo.json");

    {
        let store = LocalGraphStore::open(&path);
        contributor(&store, "Alice", "alice@x.com", 2);
        contributor(&store, "Bob", "bob@x.com", 1);
        store.persist().expect("save snapshot");
    }

    let snapshot: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        snapshot["nodes"]["contributor_alice@x.com"]["type"],
        "Contributor"
    );
    assert!(snapshot["relationships"].as_array().unwrap().is_empty());

    let store = LocalGraphStore::open(&path);
    assert_eq!(store.node_count(), 2);
    // Insertion order survives the round trip
    let rows = store.execute(&GraphQuery::new(NodeLabel::Contributor));
    assert_eq!(rows[0]["name"], "Alice");
}

#[test]
fn test_corrupt_snapshot_starts_empty() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("demo.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = LocalGraphStore::open(&path);
    assert_eq!(store.node_count(), 0);
}

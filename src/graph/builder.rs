//! Graph builder: turns extracted repository metadata into graph nodes and
//! relationships.
//!
//! Every build is a full rebuild. The store is cleared first, then nodes are
//! created in dependency order (Repository, Files, Contributors, Commits,
//! Branches/Tags). Large histories are sampled through [`BuildLimits`].

use super::store_models::{props, NodeLabel, NodeRef, Properties, RelType};
use super::traits::GraphStore;
use crate::errors::{RepoChatError, Result};
use crate::models::{CommitRecord, ContributorRecord, FileRecord, RepoMetadata};
use serde_json::json;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Sampling caps for one build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildLimits {
    pub max_commits: usize,
    pub max_files: usize,
    pub max_files_per_commit: usize,
}

impl Default for BuildLimits {
    fn default() -> Self {
        Self {
            max_commits: 1000,
            max_files: 5000,
            max_files_per_commit: 50,
        }
    }
}

/// What one build wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub files: usize,
    pub contributors: usize,
    pub commits: usize,
    pub branches: usize,
    pub tags: usize,
    pub relationships: usize,
    /// Nodes or relationships skipped because a write failed or an endpoint
    /// was missing
    pub skipped: usize,
    /// Whether the snapshot (local backend) was written
    pub persisted: bool,
}

impl BuildStats {
    pub fn nodes(&self) -> usize {
        1 + self.files + self.contributors + self.commits + self.branches + self.tags
    }
}

/// Drives a [`GraphStore`] through one full rebuild.
pub struct GraphBuilder<'a> {
    store: &'a dyn GraphStore,
    limits: BuildLimits,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(store: &'a dyn GraphStore, limits: BuildLimits) -> Self {
        Self { store, limits }
    }

    /// Rebuild the graph for one repository.
    ///
    /// `progress` is called at fixed checkpoints with a percentage and a
    /// message, never per item. Only a failed clear or a failed Repository
    /// node aborts the build; any other failed write is logged and skipped.
    pub fn build(
        &self,
        repository_id: &str,
        metadata: &RepoMetadata,
        progress: &mut dyn FnMut(u8, &str),
    ) -> Result<BuildStats> {
        let mut stats = BuildStats::default();
        let repo_ref = NodeRef::new(NodeLabel::Repository, repository_id);

        progress(0, "Clearing existing graph");
        self.store
            .clear()
            .map_err(|e| RepoChatError::Build(format!("could not clear graph: {e}")))?;

        let commits: Vec<&CommitRecord> = metadata
            .commits
            .iter()
            .take(self.limits.max_commits)
            .collect();
        let files: Vec<&FileRecord> = metadata.files.iter().take(self.limits.max_files).collect();
        let contributors: Cow<'_, [ContributorRecord]> = if metadata.contributors.is_empty() {
            Cow::Owned(ContributorRecord::aggregate(&metadata.commits))
        } else {
            Cow::Borrowed(&metadata.contributors)
        };

        // 1. Repository
        progress(10, "Creating repository node");
        let repo = &metadata.repository;
        let repo_props = props(json!({
            "path": repo.path,
            "active_branch": repo.active_branch,
            "total_commits": repo.total_commits,
            "size_mb": repo.size_mb,
            "branches": repo.branches,
            "tags": repo.tags,
            "file_count": files.len(),
            "contributor_count": contributors.len(),
        }));
        self.store
            .upsert_node(NodeLabel::Repository, repository_id, repo_props)
            .map_err(|e| RepoChatError::Build(format!("could not create repository node: {e}")))?;

        // 2. Files
        progress(20, &format!("Creating {} file nodes", files.len()));
        let change_counts = self.change_counts(&commits);
        for file in &files {
            let mut file_props = file_properties(file);
            file_props.insert(
                "change_count".to_string(),
                json!(change_counts.get(file.path.as_str()).copied().unwrap_or(0)),
            );
            if self.upsert(NodeLabel::File, &file.path, file_props, &mut stats) {
                stats.files += 1;
                self.link(
                    &NodeRef::new(NodeLabel::File, file.path.as_str()),
                    &repo_ref,
                    RelType::BelongsTo,
                    Properties::new(),
                    &mut stats,
                );
            }
        }

        // 3. Contributors
        progress(35, &format!("Creating {} contributor nodes", contributors.len()));
        for contributor in contributors.iter() {
            let contributor_props = props(json!({
                "name": contributor.name,
                "commits": contributor.commits,
                "first_commit": contributor.first_commit,
                "last_commit": contributor.last_commit,
                "total_additions": contributor.total_additions,
                "total_deletions": contributor.total_deletions,
            }));
            if self.upsert(NodeLabel::Contributor, &contributor.email, contributor_props, &mut stats) {
                stats.contributors += 1;
                self.link(
                    &NodeRef::new(NodeLabel::Contributor, contributor.email.as_str()),
                    &repo_ref,
                    RelType::ContributesTo,
                    Properties::new(),
                    &mut stats,
                );
            }
        }

        // 4. Commits, AUTHORED and MODIFIED
        progress(50, &format!("Creating {} commit nodes", commits.len()));
        let quarter = (commits.len() / 4).max(1);
        for (i, commit) in commits.iter().enumerate() {
            self.add_commit(commit, &repo_ref, &mut stats);

            let done = i + 1;
            if done % quarter == 0 && done < commits.len() {
                let pct = 50 + (30 * done / commits.len()) as u8;
                progress(pct, &format!("Processed {}/{} commits", done, commits.len()));
            }
        }

        // 5. Branches and tags
        progress(90, "Creating branch and tag nodes");
        for branch in &metadata.branches {
            let branch_props = props(json!({
                "last_commit": branch.last_commit,
                "last_commit_date": branch.last_commit_date,
                "author": branch.author,
            }));
            if self.upsert(NodeLabel::Branch, &branch.name, branch_props, &mut stats) {
                stats.branches += 1;
            }
        }
        for tag in &metadata.tags {
            let tag_props = props(json!({
                "commit": tag.commit,
                "date": tag.date,
                "message": tag.message,
            }));
            if self.upsert(NodeLabel::Tag, &tag.name, tag_props, &mut stats) {
                stats.tags += 1;
            }
        }

        progress(95, "Saving graph");
        match self.store.persist() {
            Ok(()) => stats.persisted = true,
            Err(e) => warn!("Graph built but could not be saved: {}", e),
        }

        if stats.skipped > 0 {
            warn!(
                "Graph build for {} skipped {} item(s); run with --log-level debug for details",
                repository_id, stats.skipped
            );
        }
        info!(
            "Built graph for {}: {} nodes, {} relationships",
            repository_id,
            stats.nodes(),
            stats.relationships
        );
        progress(100, "Graph build complete");
        Ok(stats)
    }

    fn add_commit(&self, commit: &CommitRecord, repo_ref: &NodeRef, stats: &mut BuildStats) {
        let changes = &commit.modified_files;
        let commit_props = props(json!({
            "message": commit.message,
            "author_name": commit.author.name,
            "author_email": commit.author.email,
            "date": commit.date,
            "is_bug_fix": commit.is_bug_fix(),
            "modified_files_count": changes.len(),
            "additions": commit.insertions,
            "deletions": commit.deletions,
            "net_changes": commit.net_changes(),
        }));
        if !self.upsert(NodeLabel::Commit, &commit.hash, commit_props, stats) {
            return;
        }
        stats.commits += 1;

        let commit_ref = NodeRef::new(NodeLabel::Commit, commit.hash.as_str());
        self.link(&commit_ref, repo_ref, RelType::BelongsTo, Properties::new(), stats);
        self.link(
            &NodeRef::new(NodeLabel::Contributor, commit.author.email.as_str()),
            &commit_ref,
            RelType::Authored,
            props(json!({"additions": commit.insertions, "deletions": commit.deletions})),
            stats,
        );

        for change in changes.iter().take(self.limits.max_files_per_commit) {
            self.link(
                &commit_ref,
                &NodeRef::new(NodeLabel::File, change.path.as_str()),
                RelType::Modified,
                props(json!({
                    "change_type": change.change_type.as_str(),
                    "added_lines": change.added_lines,
                    "deleted_lines": change.deleted_lines,
                })),
                stats,
            );
        }
    }

    /// Times each path is touched by the sampled commits.
    fn change_counts<'c>(&self, commits: &[&'c CommitRecord]) -> HashMap<&'c str, usize> {
        let mut counts = HashMap::new();
        for commit in commits {
            for change in commit.modified_files.iter().take(self.limits.max_files_per_commit) {
                *counts.entry(change.path.as_str()).or_insert(0) += 1;
            }
        }
        counts
    }

    fn upsert(&self, label: NodeLabel, key: &str, properties: Properties, stats: &mut BuildStats) -> bool {
        match self.store.upsert_node(label, key, properties) {
            Ok(()) => true,
            Err(e) => {
                let err = RepoChatError::PartialIngestion {
                    item: format!("{} node {}", label.as_str(), key),
                    reason: e.to_string(),
                };
                debug!("{}", err);
                stats.skipped += 1;
                false
            }
        }
    }

    fn link(
        &self,
        from: &NodeRef,
        to: &NodeRef,
        rel: RelType,
        properties: Properties,
        stats: &mut BuildStats,
    ) {
        match self.store.create_relationship(from, to, rel, properties) {
            Ok(()) => stats.relationships += 1,
            Err(e) => {
                let err = RepoChatError::PartialIngestion {
                    item: format!("{} {} -> {}", rel.as_str(), from.id(), to.id()),
                    reason: e.to_string(),
                };
                debug!("{}", err);
                stats.skipped += 1;
            }
        }
    }
}

fn file_properties(file: &FileRecord) -> Properties {
    props(json!({
        "name": file.name,
        "extension": file.extension,
        "language": file.language,
        "size_bytes": file.size_bytes,
        "lines_of_code": file.lines_of_code,
        "last_modified": file.last_modified,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::query::QueryPlan;
    use crate::graph::store::LocalGraphStore;
    use crate::graph::traits::{BackendKind, GraphStats};
    use crate::graph::{GraphError, Row};
    use crate::models::{Author, ChangeType, FileChange, RepositoryInfo};

    fn fixture(commit_count: usize, file_count: usize) -> RepoMetadata {
        let files: Vec<FileRecord> = (0..file_count)
            .map(|i| FileRecord::from_path(&format!("src/file{i}.py"), 100, 10))
            .collect();
        let commits: Vec<CommitRecord> = (0..commit_count)
            .map(|i| {
                let email = if i % 2 == 0 { "alice@x.com" } else { "bob@x.com" };
                CommitRecord {
                    hash: format!("{i:040x}"),
                    message: if i == 0 { "Fix crash".into() } else { format!("Change {i}") },
                    author: Author::new(email.split('@').next().unwrap(), email),
                    date: format!("2024-01-{:02}T00:00:00+00:00", i % 28 + 1),
                    insertions: 3,
                    deletions: 1,
                    modified_files: vec![
                        FileChange::new("src/file0.py", ChangeType::Modify, 3, 1),
                        FileChange::new("src/deleted.py", ChangeType::Delete, 0, 4),
                    ],
                }
            })
            .collect();
        RepoMetadata {
            repository: RepositoryInfo {
                name: "demo".into(),
                total_commits: commit_count,
                ..Default::default()
            },
            contributors: ContributorRecord::aggregate(&commits),
            commits,
            files,
            branches: vec![],
            tags: vec![],
        }
    }

    fn build(store: &dyn GraphStore, metadata: &RepoMetadata, limits: BuildLimits) -> BuildStats {
        GraphBuilder::new(store, limits)
            .build("demo", metadata, &mut |_, _| {})
            .expect("build succeeds")
    }

    #[test]
    fn test_node_counts_respect_caps() {
        let store = LocalGraphStore::in_memory();
        let limits = BuildLimits {
            max_commits: 4,
            max_files: 3,
            max_files_per_commit: 50,
        };
        build(&store, &fixture(6, 5), limits);

        let stats = store.stats().unwrap();
        assert_eq!(stats.node_count(NodeLabel::Repository), 1);
        assert_eq!(stats.node_count(NodeLabel::Commit), 4);
        assert_eq!(stats.node_count(NodeLabel::File), 3);
        assert_eq!(stats.node_count(NodeLabel::Contributor), 2);
        assert_eq!(stats.relationship_count(RelType::Authored), 4);
        assert_eq!(stats.relationship_count(RelType::ContributesTo), 2);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let store = LocalGraphStore::in_memory();
        let metadata = fixture(5, 4);

        build(&store, &metadata, BuildLimits::default());
        let first = store.stats().unwrap();
        build(&store, &metadata, BuildLimits::default());
        let second = store.stats().unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_file_reference_is_skipped() {
        let store = LocalGraphStore::in_memory();
        let stats = build(&store, &fixture(3, 2), BuildLimits::default());

        // Every commit touches src/deleted.py, which has no File node
        assert_eq!(stats.skipped, 3);
        assert_eq!(stats.commits, 3);
        assert_eq!(
            store.stats().unwrap().relationship_count(RelType::Modified),
            3
        );
    }

    #[test]
    fn test_per_commit_file_cap() {
        let store = LocalGraphStore::in_memory();
        let limits = BuildLimits {
            max_files_per_commit: 1,
            ..Default::default()
        };
        let stats = build(&store, &fixture(3, 2), limits);
        assert_eq!(stats.skipped, 0);
        assert_eq!(
            store.stats().unwrap().relationship_count(RelType::Modified),
            3
        );
    }

    #[test]
    fn test_commit_and_file_properties() {
        let store = LocalGraphStore::in_memory();
        build(&store, &fixture(3, 2), BuildLimits::default());

        let commit = store.node(&format!("commit_{:040x}", 0)).unwrap();
        assert_eq!(commit.properties["is_bug_fix"], true);
        assert_eq!(commit.properties["net_changes"], 2);
        assert_eq!(commit.get_str("author_email"), Some("alice@x.com"));

        let file = store.node("file_src/file0.py").unwrap();
        assert_eq!(file.get_i64("change_count"), Some(3));
        assert_eq!(file.get_str("language"), Some("Python"));

        let repo = store.node("repository_demo").unwrap();
        assert_eq!(repo.get_i64("contributor_count"), Some(2));
    }

    #[test]
    fn test_progress_checkpoints_are_bounded() {
        let store = LocalGraphStore::in_memory();
        let mut seen = Vec::new();
        GraphBuilder::new(&store, BuildLimits::default())
            .build("demo", &fixture(100, 4), &mut |pct, _| seen.push(pct))
            .unwrap();

        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!(seen.len() <= 12, "too many callbacks: {seen:?}");
    }

    /// Store whose node writes fail for one label
    struct FailingStore {
        inner: LocalGraphStore,
        fail_label: NodeLabel,
    }

    impl GraphStore for FailingStore {
        fn kind(&self) -> BackendKind {
            BackendKind::Local
        }
        fn clear(&self) -> std::result::Result<(), GraphError> {
            self.inner.clear()
        }
        fn upsert_node(
            &self,
            label: NodeLabel,
            key: &str,
            properties: Properties,
        ) -> std::result::Result<(), GraphError> {
            if label == self.fail_label {
                return Err(GraphError::Query("write rejected".into()));
            }
            self.inner.upsert_node(label, key, properties)
        }
        fn create_relationship(
            &self,
            from: &NodeRef,
            to: &NodeRef,
            rel: RelType,
            properties: Properties,
        ) -> std::result::Result<(), GraphError> {
            self.inner.create_relationship(from, to, rel, properties)
        }
        fn run_query(&self, plan: &QueryPlan) -> std::result::Result<Vec<Row>, GraphError> {
            self.inner.run_query(plan)
        }
        fn stats(&self) -> std::result::Result<GraphStats, GraphError> {
            self.inner.stats()
        }
    }

    #[test]
    fn test_repository_failure_aborts_build() {
        let store = FailingStore {
            inner: LocalGraphStore::in_memory(),
            fail_label: NodeLabel::Repository,
        };
        let result = GraphBuilder::new(&store, BuildLimits::default()).build(
            "demo",
            &fixture(2, 2),
            &mut |_, _| {},
        );
        assert!(matches!(result, Err(RepoChatError::Build(_))));
    }

    #[test]
    fn test_contributor_failure_skips_authored_links() {
        let store = FailingStore {
            inner: LocalGraphStore::in_memory(),
            fail_label: NodeLabel::Contributor,
        };
        let stats = build(&store, &fixture(2, 2), BuildLimits::default());

        assert_eq!(stats.contributors, 0);
        assert_eq!(stats.commits, 2);
        assert_eq!(store.stats().unwrap().relationship_count(RelType::Authored), 0);
    }
}

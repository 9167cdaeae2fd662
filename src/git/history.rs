//! Git history extraction using libgit2
//!
//! Walks commits newest-first, computes per-file line stats for each commit,
//! and scans the working tree (honoring .gitignore) for source files.

use crate::errors::{RepoChatError, Result};
use crate::models::{
    language_for_extension, Author, BranchRecord, ChangeType, CommitRecord, ContributorRecord,
    FileChange, FileRecord, MetadataExtractor, RepoMetadata, RepositoryInfo, TagRecord,
};
use chrono::{DateTime, TimeZone, Utc};
use git2::{BranchType, Delta, Repository, Sort};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// [`MetadataExtractor`] over a local git checkout.
pub struct GitMetadataExtractor {
    repo: Repository,
    root: PathBuf,
    max_commits: usize,
    max_files: usize,
}

impl GitMetadataExtractor {
    /// Open the repository containing `path`.
    ///
    /// A missing path, a directory outside any git repository, or a bare
    /// repository is a configuration error.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RepoChatError::Configuration(format!(
                "Repository path does not exist: {}",
                path.display()
            )));
        }
        let repo = Repository::discover(path).map_err(|_| {
            RepoChatError::Configuration(format!("Not a git repository: {}", path.display()))
        })?;
        let root = repo
            .workdir()
            .ok_or_else(|| {
                RepoChatError::Configuration(
                    "Repository has no working directory (bare repo?)".to_string(),
                )
            })?
            .to_path_buf();
        debug!("Opened git repository at {:?}", repo.path());

        Ok(Self {
            repo,
            root,
            max_commits: 1000,
            max_files: 5000,
        })
    }

    pub fn with_limits(mut self, max_commits: usize, max_files: usize) -> Self {
        self.max_commits = max_commits;
        self.max_files = max_files;
        self
    }

    /// Check if a path is inside a git repository.
    pub fn is_git_repo(path: &Path) -> bool {
        Repository::discover(path).is_ok()
    }

    /// Working directory root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory name of the working tree, used as the repository id.
    pub fn repository_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "repository".to_string())
    }

    /// Most recent commits, newest first, bounded by `max_commits`.
    pub fn commits(&self) -> Result<Vec<CommitRecord>> {
        if self.repo.head().is_err() {
            // Unborn HEAD: no commits yet
            return Ok(Vec::new());
        }
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push_head()?;

        let mut commits = Vec::new();
        for oid in revwalk.take(self.max_commits) {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(self.extract_commit(&commit)?);
        }
        Ok(commits)
    }

    fn total_commits(&self) -> usize {
        let Ok(mut revwalk) = self.repo.revwalk() else {
            return 0;
        };
        if revwalk.push_head().is_err() {
            return 0;
        }
        revwalk.count()
    }

    fn extract_commit(&self, commit: &git2::Commit) -> Result<CommitRecord> {
        let author = commit.author();

        let parent = commit.parent(0).ok();
        let tree = commit.tree()?;
        let parent_tree = parent.as_ref().map(|p| p.tree()).transpose()?;

        let mut diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
        diff.find_similar(None)?;

        let mut modified_files = Vec::new();
        let (mut insertions, mut deletions) = (0, 0);
        for (idx, delta) in diff.deltas().enumerate() {
            let change_type = match delta.status() {
                Delta::Added => ChangeType::Add,
                Delta::Deleted => ChangeType::Delete,
                Delta::Renamed => ChangeType::Rename,
                Delta::Copied => ChangeType::Copy,
                _ => ChangeType::Modify,
            };
            let file = if change_type == ChangeType::Delete {
                delta.old_file()
            } else {
                delta.new_file()
            };
            let Some(path) = file.path() else {
                continue;
            };

            // Binary files have no patch
            let (added, deleted) = match git2::Patch::from_diff(&diff, idx)? {
                Some(patch) => {
                    let (_, added, deleted) = patch.line_stats()?;
                    (added, deleted)
                }
                None => (0, 0),
            };
            insertions += added;
            deletions += deleted;
            modified_files.push(FileChange::new(
                path.to_string_lossy().replace('\\', "/"),
                change_type,
                added,
                deleted,
            ));
        }

        Ok(CommitRecord {
            hash: commit.id().to_string(),
            message: commit.message().unwrap_or("").trim().to_string(),
            author: Author::new(
                author.name().unwrap_or("Unknown"),
                author.email().unwrap_or(""),
            ),
            date: format_git_time(&commit.time()),
            insertions,
            deletions,
            modified_files,
        })
    }

    /// Source files in the working tree plus the total size of every
    /// non-ignored file in bytes.
    pub fn files(&self) -> (Vec<FileRecord>, u64) {
        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .build();

        let mut files = Vec::new();
        let mut total_bytes = 0u64;
        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path();
            let Ok(meta) = path.metadata() else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            total_bytes += meta.len();

            if files.len() >= self.max_files {
                continue;
            }
            let is_source = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| language_for_extension(ext).is_some());
            if !is_source {
                continue;
            }
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };

            let lines = std::fs::read(path).map(|c| count_lines(&c)).unwrap_or(0);
            let mut record = FileRecord::from_path(
                &relative.to_string_lossy().replace('\\', "/"),
                meta.len(),
                lines,
            );
            record.last_modified = meta
                .modified()
                .ok()
                .map(|t| DateTime::<Utc>::from(t).to_rfc3339());
            files.push(record);
        }
        (files, total_bytes)
    }

    pub fn branches(&self) -> Result<Vec<BranchRecord>> {
        let mut branches = Vec::new();
        for branch in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            let Some(name) = branch.name()?.map(str::to_string) else {
                continue;
            };
            let Ok(commit) = branch.get().peel_to_commit() else {
                continue;
            };
            branches.push(BranchRecord {
                name,
                last_commit: commit.id().to_string(),
                last_commit_date: format_git_time(&commit.time()),
                author: commit.author().name().unwrap_or("Unknown").to_string(),
            });
        }
        Ok(branches)
    }

    pub fn tags(&self) -> Result<Vec<TagRecord>> {
        let mut tags = Vec::new();
        for name in self.repo.tag_names(None)?.iter().flatten() {
            let Ok(object) = self.repo.revparse_single(&format!("refs/tags/{name}")) else {
                continue;
            };
            let message = object
                .as_tag()
                .and_then(|t| t.message())
                .map(|m| m.trim().to_string());
            let commit = object.peel_to_commit().ok();
            tags.push(TagRecord {
                name: name.to_string(),
                commit: commit
                    .as_ref()
                    .map(|c| c.id().to_string())
                    .unwrap_or_default(),
                date: commit.as_ref().map(|c| format_git_time(&c.time())),
                message,
            });
        }
        Ok(tags)
    }

    fn active_branch(&self) -> String {
        self.repo
            .head()
            .ok()
            .and_then(|h| h.shorthand().map(str::to_string))
            .unwrap_or_else(|| "HEAD".to_string())
    }
}

impl MetadataExtractor for GitMetadataExtractor {
    fn extract_metadata(&self) -> Result<RepoMetadata> {
        let commits = self.commits()?;
        let (files, total_bytes) = self.files();
        let branches = self.branches()?;
        let tags = self.tags()?;
        let contributors = ContributorRecord::aggregate(&commits);

        let repository = RepositoryInfo {
            name: self.repository_name(),
            path: self.root.to_string_lossy().to_string(),
            active_branch: self.active_branch(),
            total_commits: self.total_commits(),
            size_mb: (total_bytes as f64 / 1_048_576.0 * 100.0).round() / 100.0,
            branches: branches.iter().map(|b| b.name.clone()).collect(),
            tags: tags.iter().map(|t| t.name.clone()).collect(),
        };
        info!(
            "Extracted {}: {} commits, {} files, {} contributors",
            repository.name,
            commits.len(),
            files.len(),
            contributors.len()
        );

        Ok(RepoMetadata {
            repository,
            commits,
            files,
            contributors,
            branches,
            tags,
        })
    }
}

fn count_lines(content: &[u8]) -> usize {
    let newlines = content.iter().filter(|&&b| b == b'\n').count();
    if content.last().is_some_and(|&b| b != b'\n') {
        newlines + 1
    } else {
        newlines
    }
}

/// Format a git timestamp as ISO 8601.
fn format_git_time(time: &git2::Time) -> String {
    match Utc.timestamp_opt(time.seconds(), 0).single() {
        Some(dt) => dt.to_rfc3339(),
        None => "1970-01-01T00:00:00+00:00".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Signature, Time};
    use tempfile::tempdir;

    const DAY: i64 = 86_400;
    const JAN_1_2024: i64 = 1_704_067_200;

    fn commit_file(
        repo: &Repository,
        path: &str,
        content: &str,
        (name, email): (&str, &str),
        when: i64,
        message: &str,
    ) -> anyhow::Result<git2::Oid> {
        let root = repo.workdir().unwrap();
        std::fs::write(root.join(path), content)?;
        let mut index = repo.index()?;
        index.add_path(Path::new(path))?;
        index.write()?;
        let tree = repo.find_tree(index.write_tree()?)?;

        let sig = Signature::new(name, email, &Time::new(when, 0))?;
        let parents = match repo.head() {
            Ok(head) => vec![head.peel_to_commit()?],
            Err(_) => vec![],
        };
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        Ok(repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)?)
    }

    fn numbered_lines(n: usize) -> String {
        (1..=n).map(|i| format!("line {i}\n")).collect()
    }

    fn create_test_repo() -> anyhow::Result<(tempfile::TempDir, Repository)> {
        let dir = tempdir()?;
        let repo = Repository::init(dir.path())?;
        let alice = ("alice", "alice@x.com");
        let bob = ("bob", "bob@x.com");

        commit_file(&repo, "file1.py", &numbered_lines(10), alice, JAN_1_2024, "Add file1")?;
        let modified = numbered_lines(10).replacen("line 1\n", "changed 1\n", 1) + "line 11\n";
        commit_file(&repo, "file1.py", &modified, bob, JAN_1_2024 + DAY, "Fix off-by-one in file1")?;
        let head = commit_file(&repo, "file2.py", &numbered_lines(5), alice, JAN_1_2024 + 2 * DAY, "Add file2")?;

        {
            let head_obj = repo.find_object(head, None)?;
            repo.tag_lightweight("v1.0", &head_obj, false)?;
        }
        Ok((dir, repo))
    }

    #[test]
    fn test_open_rejects_missing_and_non_repo_paths() -> anyhow::Result<()> {
        let missing = GitMetadataExtractor::open(Path::new("/definitely/not/here"));
        assert!(matches!(missing, Err(RepoChatError::Configuration(_))));

        let plain = tempdir()?;
        let not_git = GitMetadataExtractor::open(plain.path());
        assert!(matches!(not_git, Err(RepoChatError::Configuration(_))));
        assert!(!GitMetadataExtractor::is_git_repo(plain.path()));
        Ok(())
    }

    #[test]
    fn test_commit_history_and_line_stats() -> anyhow::Result<()> {
        let (dir, _repo) = create_test_repo()?;
        let extractor = GitMetadataExtractor::open(dir.path())?;
        let commits = extractor.commits()?;

        assert_eq!(commits.len(), 3);
        assert_eq!(commits[0].message, "Add file2");
        assert_eq!(commits[0].insertions, 5);
        assert_eq!(commits[0].date, "2024-01-03T00:00:00+00:00");

        let fix = &commits[1];
        assert_eq!(fix.author.email, "bob@x.com");
        assert_eq!((fix.insertions, fix.deletions), (2, 1));
        assert_eq!(fix.modified_files[0].change_type, ChangeType::Modify);
        assert!(fix.is_bug_fix());

        assert_eq!(commits[2].modified_files[0].change_type, ChangeType::Add);
        assert_eq!(commits[2].insertions, 10);
        Ok(())
    }

    #[test]
    fn test_commit_limit() -> anyhow::Result<()> {
        let (dir, _repo) = create_test_repo()?;
        let extractor = GitMetadataExtractor::open(dir.path())?.with_limits(2, 100);
        assert_eq!(extractor.commits()?.len(), 2);
        assert_eq!(extractor.total_commits(), 3);
        Ok(())
    }

    #[test]
    fn test_extract_metadata() -> anyhow::Result<()> {
        let (dir, _repo) = create_test_repo()?;
        let metadata = GitMetadataExtractor::open(dir.path())?.extract_metadata()?;

        assert_eq!(metadata.repository.total_commits, 3);
        assert_eq!(metadata.repository.tags, vec!["v1.0".to_string()]);
        assert_eq!(metadata.branches.len(), 1);
        assert_eq!(metadata.branches[0].last_commit, metadata.commits[0].hash);
        assert_eq!(metadata.tags[0].commit, metadata.commits[0].hash);

        let mut paths: Vec<&str> = metadata.files.iter().map(|f| f.path.as_str()).collect();
        paths.sort();
        assert_eq!(paths, vec!["file1.py", "file2.py"]);
        let file1 = metadata.files.iter().find(|f| f.path == "file1.py").unwrap();
        assert_eq!(file1.lines_of_code, 11);
        assert_eq!(file1.language, "Python");

        let alice = metadata
            .contributors
            .iter()
            .find(|c| c.email == "alice@x.com")
            .unwrap();
        assert_eq!(alice.commits, 2);
        Ok(())
    }

    #[test]
    fn test_empty_repository_has_no_commits() -> anyhow::Result<()> {
        let dir = tempdir()?;
        Repository::init(dir.path())?;
        let metadata = GitMetadataExtractor::open(dir.path())?.extract_metadata()?;
        assert!(metadata.commits.is_empty());
        assert_eq!(metadata.repository.active_branch, "HEAD");
        Ok(())
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(b""), 0);
        assert_eq!(count_lines(b"a\nb\n"), 2);
        assert_eq!(count_lines(b"a\nb"), 2);
    }
}

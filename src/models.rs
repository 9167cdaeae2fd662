//! Core data models for repochat
//!
//! Plain records produced by a [`MetadataExtractor`] and consumed by the
//! graph builder. They carry no graph identity of their own; the builder
//! decides labels and keys.

use crate::errors::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Commit message keywords that mark a commit as a bug fix.
pub const BUG_FIX_KEYWORDS: &[&str] = &[
    "fix",
    "fixes",
    "fixed",
    "bug",
    "issue",
    "error",
    "problem",
    "resolve",
    "resolves",
    "resolved",
    "correction",
    "patch",
];

/// Map a file extension (without the dot) to a display language.
///
/// Returns `None` for extensions that are not tracked as source files.
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let lang = match ext.to_ascii_lowercase().as_str() {
        "java" => "Java",
        "py" => "Python",
        "js" => "JavaScript",
        "ts" => "TypeScript",
        "cpp" | "hpp" => "C++",
        "c" => "C",
        "h" => "C/C++",
        "cs" => "C#",
        "php" => "PHP",
        "rb" => "Ruby",
        "go" => "Go",
        "rs" => "Rust",
        "kt" => "Kotlin",
        "scala" => "Scala",
        "sql" => "SQL",
        "xml" => "XML",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "md" => "Markdown",
        "gradle" => "Gradle",
        "properties" => "Properties",
        _ => return None,
    };
    Some(lang)
}

/// Repository-level facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub path: String,
    pub active_branch: String,
    pub total_commits: usize,
    pub size_mb: f64,
    pub branches: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// How a commit touched a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Add,
    Modify,
    Delete,
    Rename,
    Copy,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Add => "ADD",
            ChangeType::Modify => "MODIFY",
            ChangeType::Delete => "DELETE",
            ChangeType::Rename => "RENAME",
            ChangeType::Copy => "COPY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub change_type: ChangeType,
    pub added_lines: usize,
    pub deleted_lines: usize,
}

impl FileChange {
    pub fn new(path: impl Into<String>, change_type: ChangeType, added: usize, deleted: usize) -> Self {
        Self {
            path: path.into(),
            change_type,
            added_lines: added,
            deleted_lines: deleted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit hash
    pub hash: String,
    pub message: String,
    pub author: Author,
    /// RFC 3339, UTC
    pub date: String,
    pub insertions: usize,
    pub deletions: usize,
    pub modified_files: Vec<FileChange>,
}

impl CommitRecord {
    /// Keyword heuristic over the message, case-insensitive.
    pub fn is_bug_fix(&self) -> bool {
        let message = self.message.to_lowercase();
        BUG_FIX_KEYWORDS.iter().any(|kw| message.contains(kw))
    }

    pub fn net_changes(&self) -> i64 {
        self.insertions as i64 - self.deletions as i64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Repository-relative path with `/` separators
    pub path: String,
    pub name: String,
    pub extension: String,
    pub language: String,
    pub size_bytes: u64,
    pub lines_of_code: usize,
    pub last_modified: Option<String>,
}

impl FileRecord {
    /// Build a record from a relative path, deriving name, extension and language.
    pub fn from_path(path: &str, size_bytes: u64, lines_of_code: usize) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_string())
            .unwrap_or_default();
        let language = language_for_extension(&extension)
            .unwrap_or("Unknown")
            .to_string();
        Self {
            path: path.to_string(),
            name,
            extension,
            language,
            size_bytes,
            lines_of_code,
            last_modified: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributorRecord {
    pub name: String,
    pub email: String,
    pub commits: usize,
    pub first_commit: String,
    pub last_commit: String,
    pub total_additions: usize,
    pub total_deletions: usize,
}

impl ContributorRecord {
    /// Aggregate contributors from commits, keyed by email.
    ///
    /// Output order is the order in which each email first appears.
    pub fn aggregate(commits: &[CommitRecord]) -> Vec<ContributorRecord> {
        let mut by_email: IndexMap<String, ContributorRecord> = IndexMap::new();

        for commit in commits {
            let entry = by_email
                .entry(commit.author.email.clone())
                .or_insert_with(|| ContributorRecord {
                    name: commit.author.name.clone(),
                    email: commit.author.email.clone(),
                    first_commit: commit.date.clone(),
                    last_commit: commit.date.clone(),
                    ..Default::default()
                });

            entry.commits += 1;
            entry.total_additions += commit.insertions;
            entry.total_deletions += commit.deletions;
            // RFC 3339 UTC strings order lexicographically
            if commit.date < entry.first_commit {
                entry.first_commit = commit.date.clone();
            }
            if commit.date > entry.last_commit {
                entry.last_commit = commit.date.clone();
            }
        }

        by_email.into_values().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchRecord {
    pub name: String,
    pub last_commit: String,
    pub last_commit_date: String,
    pub author: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    pub name: String,
    pub commit: String,
    pub date: Option<String>,
    pub message: Option<String>,
}

/// Everything one extraction pass produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoMetadata {
    pub repository: RepositoryInfo,
    pub commits: Vec<CommitRecord>,
    pub files: Vec<FileRecord>,
    pub contributors: Vec<ContributorRecord>,
    pub branches: Vec<BranchRecord>,
    pub tags: Vec<TagRecord>,
}

/// Source of repository metadata.
pub trait MetadataExtractor {
    fn extract_metadata(&self) -> Result<RepoMetadata>;
}

/// Pre-extracted metadata acts as its own extractor (fixtures, cached runs).
impl MetadataExtractor for RepoMetadata {
    fn extract_metadata(&self) -> Result<RepoMetadata> {
        Ok(self.clone())
    }
}

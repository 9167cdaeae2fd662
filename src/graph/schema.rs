//! Graph schema for the remote backend and the LLM prompt
//!
//! Constraint and index statements are idempotent (`IF NOT EXISTS`) so they
//! can run on every connection.

/// Get all schema statements to initialize the database.
pub fn get_schema_statements() -> Vec<&'static str> {
    let mut statements = Vec::new();
    statements.extend(CONSTRAINTS.iter().copied());
    statements.extend(INDEXES.iter().copied());
    statements
}

/// Uniqueness constraints on natural keys
const CONSTRAINTS: &[&str] = &[
    "CREATE CONSTRAINT repository_name IF NOT EXISTS FOR (r:Repository) REQUIRE r.name IS UNIQUE",
    "CREATE CONSTRAINT commit_hash IF NOT EXISTS FOR (c:Commit) REQUIRE c.hash IS UNIQUE",
    "CREATE CONSTRAINT file_path IF NOT EXISTS FOR (f:File) REQUIRE f.path IS UNIQUE",
    "CREATE CONSTRAINT contributor_email IF NOT EXISTS FOR (c:Contributor) REQUIRE c.email IS UNIQUE",
];

const INDEXES: &[&str] = &[
    "CREATE INDEX commit_date IF NOT EXISTS FOR (c:Commit) ON (c.date)",
    "CREATE INDEX file_language IF NOT EXISTS FOR (f:File) ON (f.language)",
];

/// Schema description handed to the LLM query generator.
pub const SCHEMA_DESCRIPTION: &str = "\
Node labels and properties:
- Repository {name, path, active_branch, total_commits, size_mb, branches, tags, file_count, contributor_count}
- Commit {hash, message, author_name, author_email, date, is_bug_fix, modified_files_count, additions, deletions, net_changes}
- Contributor {name, email, commits, first_commit, last_commit, total_additions, total_deletions}
- File {name, path, extension, language, size_bytes, lines_of_code, last_modified, change_count}
- Branch {name, last_commit, last_commit_date, author}
- Tag {name, commit, date, message}

Relationships:
- (Contributor)-[:AUTHORED {additions, deletions}]->(Commit)
- (Commit)-[:MODIFIED {change_type, added_lines, deleted_lines}]->(File)
- (File)-[:BELONGS_TO]->(Repository)
- (Commit)-[:BELONGS_TO]->(Repository)
- (Contributor)-[:CONTRIBUTES_TO]->(Repository)

Dates are ISO 8601 strings in UTC and compare as strings.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_are_idempotent() {
        let statements = get_schema_statements();
        assert_eq!(statements.len(), 6);
        assert!(statements.iter().all(|s| s.contains("IF NOT EXISTS")));
    }

    #[test]
    fn test_description_names_every_label() {
        for label in crate::graph::NodeLabel::ALL {
            assert!(SCHEMA_DESCRIPTION.contains(label.as_str()));
        }
    }
}

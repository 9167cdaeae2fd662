//! Turns typed result rows into an answer

use super::executor::{CommitRow, ContributorRow, FileRow, OverviewRow, ResultRow};
use crate::ai::LlmCollaborator;
use crate::graph::Row;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;

/// Rows listed before the "... and N more" line
pub const DISPLAY_CAP: usize = 10;

pub const NO_RESULTS: &str = "No results found for your question.";

/// Questions offered when a question cannot be answered
pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "Who are the top contributors?",
    "Show recent commits",
    "Show bug fix commits",
    "Which files change most often?",
    "What are the largest files?",
    "Give me a repository overview",
    "Find <name>",
    "Commits this week",
];

fn plural(n: i64, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn first_line(message: &str, max: usize) -> String {
    let line = message.lines().next().unwrap_or("").trim();
    if line.chars().count() > max {
        let cut: String = line.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

fn contributor_line(c: &ContributorRow) -> String {
    let mut line = c.name.clone();
    if !c.email.is_empty() {
        let _ = write!(line, " <{}>", c.email);
    }
    let _ = write!(line, " - {}", plural(c.commits, "commit", "commits"));
    if let (Some(added), Some(deleted)) = (c.additions, c.deletions) {
        let _ = write!(line, " (+{added}/-{deleted})");
    }
    line
}

fn commit_line(c: &CommitRow) -> String {
    let short: String = c.hash.chars().take(8).collect();
    let date: String = c.date.chars().take(10).collect();
    let mut line = format!("{short} {}", first_line(&c.message, 72));
    let _ = write!(line, " - {}", c.author);
    if !date.is_empty() {
        let _ = write!(line, ", {date}");
    }
    line
}

fn file_line(f: &FileRow) -> String {
    let mut line = f.path.clone();
    if let Some(language) = &f.language {
        let _ = write!(line, " ({language})");
    }
    let mut details = Vec::new();
    if let Some(loc) = f.lines_of_code {
        details.push(plural(loc, "line", "lines"));
    }
    if let Some(changes) = f.change_count.filter(|&n| n > 0) {
        details.push(format!("changed {}", plural(changes, "time", "times")));
    }
    if !details.is_empty() {
        let _ = write!(line, " - {}", details.join(", "));
    }
    line
}

fn generic_line(fields: &Row) -> String {
    fields
        .iter()
        .map(|(k, v)| match v {
            serde_json::Value::String(s) => format!("{k}: {s}"),
            other => format!("{k}: {other}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn overview_block(o: &OverviewRow) -> String {
    let mut block = format!("Repository: {}\n", o.name);
    if let Some(branch) = &o.active_branch {
        let _ = writeln!(block, "  Active branch: {branch}");
    }
    let _ = writeln!(block, "  Commits: {}", o.total_commits);
    if let Some(files) = o.file_count {
        let _ = writeln!(block, "  Files: {files}");
    }
    if let Some(contributors) = o.contributor_count {
        let _ = writeln!(block, "  Contributors: {contributors}");
    }
    if let Some(size) = o.size_mb {
        let _ = writeln!(block, "  Size: {size:.2} MB");
    }
    let _ = write!(block, "  Branches: {}, Tags: {}", o.branches, o.tags);
    block
}

fn noun(row: &ResultRow, count: i64) -> String {
    let (one, many) = match row {
        ResultRow::Contributor(_) => ("contributor", "contributors"),
        ResultRow::Commit(_) => ("commit", "commits"),
        ResultRow::File(_) => ("file", "files"),
        ResultRow::Overview(_) => ("repository", "repositories"),
        ResultRow::Generic { .. } => ("result", "results"),
    };
    plural(count, one, many)
}

/// Deterministic rendering of `rows`; identical rows give identical text.
pub fn render(rows: &[ResultRow]) -> String {
    let Some(first) = rows.first() else {
        return NO_RESULTS.to_string();
    };

    if rows.iter().all(|r| matches!(r, ResultRow::Overview(_))) {
        return rows
            .iter()
            .filter_map(|r| match r {
                ResultRow::Overview(o) => Some(overview_block(o)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n");
    }

    let mut out = format!("Found {}:\n", noun(first, rows.len() as i64));
    for (i, row) in rows.iter().take(DISPLAY_CAP).enumerate() {
        let line = match row {
            ResultRow::Contributor(c) => contributor_line(c),
            ResultRow::Commit(c) => commit_line(c),
            ResultRow::File(f) => file_line(f),
            ResultRow::Overview(o) => format!(
                "{} ({})",
                o.name,
                plural(o.total_commits, "commit", "commits")
            ),
            ResultRow::Generic { fields } => generic_line(fields),
        };
        let _ = writeln!(out, "  {}. {}", i + 1, line);
    }
    if rows.len() > DISPLAY_CAP {
        let _ = writeln!(out, "  ... and {} more", rows.len() - DISPLAY_CAP);
    }
    out.trim_end().to_string()
}

/// Templated reply for a question that could not be answered.
pub fn suggestion(reason: &str) -> String {
    let mut out = format!("{reason}\n\nTry asking:\n");
    for question in EXAMPLE_QUESTIONS {
        let _ = writeln!(out, "  - {question}");
    }
    out.trim_end().to_string()
}

/// Answer text from rows, optionally through the LLM
pub struct ResponseSynthesizer {
    llm: Option<Arc<dyn LlmCollaborator>>,
}

impl ResponseSynthesizer {
    pub fn new(llm: Option<Arc<dyn LlmCollaborator>>) -> Self {
        Self { llm }
    }

    /// Empty rows always get [`NO_RESULTS`]; otherwise LLM prose when
    /// available, the deterministic template when not.
    pub fn synthesize(&self, question: &str, rows: &[ResultRow]) -> String {
        if rows.is_empty() {
            return NO_RESULTS.to_string();
        }
        if let Some(llm) = &self.llm {
            match serde_json::to_string_pretty(rows) {
                Ok(json) => match llm.generate_prose(question, &json) {
                    Ok(prose) => return prose,
                    Err(e) => debug!("LLM prose failed, using template: {}", e),
                },
                Err(e) => debug!("Could not serialize rows: {}", e),
            }
        }
        render(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiError, AiResult};

    fn contributor(name: &str, commits: i64) -> ResultRow {
        ResultRow::Contributor(ContributorRow {
            name: name.to_string(),
            email: format!("{name}@x.com"),
            commits,
            additions: None,
            deletions: None,
        })
    }

    #[test]
    fn test_empty_rows_say_so() {
        let text = ResponseSynthesizer::new(None).synthesize("anything", &[]);
        assert_eq!(text, NO_RESULTS);
        assert!(!text.is_empty());
    }

    #[test]
    fn test_contributor_ranking() {
        let text = render(&[contributor("alice", 2), contributor("bob", 1)]);
        assert_eq!(
            text,
            "Found 2 contributors:\n  1. alice <alice@x.com> - 2 commits\n  2. bob <bob@x.com> - 1 commit"
        );
    }

    #[test]
    fn test_truncation_suffix() {
        let rows: Vec<ResultRow> = (0..13).map(|i| contributor(&format!("dev{i}"), 20 - i)).collect();
        let text = render(&rows);
        assert!(text.starts_with("Found 13 contributors:"));
        assert!(text.contains("  10. dev9"));
        assert!(!text.contains("dev10 "));
        assert!(text.ends_with("  ... and 3 more"));
    }

    #[test]
    fn test_commit_and_file_lines() {
        let commit = ResultRow::Commit(CommitRow {
            hash: "0123456789abcdef".to_string(),
            message: "Fix crash on empty input\n\nLonger body".to_string(),
            author: "bob".to_string(),
            date: "2024-01-02T00:00:00+00:00".to_string(),
        });
        assert_eq!(
            render(&[commit]),
            "Found 1 commit:\n  1. 01234567 Fix crash on empty input - bob, 2024-01-02"
        );

        let file = ResultRow::File(FileRow {
            path: "src/file1.py".to_string(),
            language: Some("Python".to_string()),
            lines_of_code: Some(11),
            change_count: Some(1),
        });
        assert_eq!(
            render(&[file]),
            "Found 1 file:\n  1. src/file1.py (Python) - 11 lines, changed 1 time"
        );
    }

    #[test]
    fn test_overview_block() {
        let text = render(&[ResultRow::Overview(OverviewRow {
            name: "demo".to_string(),
            active_branch: Some("main".to_string()),
            total_commits: 3,
            file_count: Some(2),
            contributor_count: Some(2),
            size_mb: Some(0.01),
            branches: 1,
            tags: 1,
        })]);
        assert!(text.starts_with("Repository: demo\n"));
        assert!(text.contains("  Commits: 3\n"));
        assert!(text.ends_with("  Branches: 1, Tags: 1"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let rows = vec![contributor("alice", 2), contributor("bob", 1)];
        assert_eq!(render(&rows), render(&rows.clone()));
    }

    struct Prose(bool);

    impl LlmCollaborator for Prose {
        fn generate_query(&self, _: &str, _: &str) -> AiResult<Option<String>> {
            Ok(None)
        }

        fn generate_prose(&self, _question: &str, rows_json: &str) -> AiResult<String> {
            if self.0 {
                assert!(rows_json.contains("\"kind\": \"contributor\""));
                Ok("Alice leads.".to_string())
            } else {
                Err(AiError::ApiError {
                    status: 500,
                    message: "boom".to_string(),
                })
            }
        }
    }

    #[test]
    fn test_llm_prose_with_template_fallback() {
        let rows = vec![contributor("alice", 2)];
        let with_prose = ResponseSynthesizer::new(Some(Arc::new(Prose(true))));
        assert_eq!(with_prose.synthesize("who?", &rows), "Alice leads.");

        let failing = ResponseSynthesizer::new(Some(Arc::new(Prose(false))));
        assert_eq!(failing.synthesize("who?", &rows), render(&rows));
    }

    #[test]
    fn test_suggestion_lists_examples() {
        let text = suggestion("I could not answer that.");
        assert!(text.starts_with("I could not answer that."));
        for question in EXAMPLE_QUESTIONS {
            assert!(text.contains(question));
        }
    }
}

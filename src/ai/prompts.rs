//! Prompt templates for query generation and answer prose

use crate::graph::query::is_read_only;
use regex::Regex;
use std::sync::OnceLock;

/// Worked question/query pairs shown to the model. Every query stays inside
/// the vocabulary the local store can interpret.
const QUERY_EXAMPLES: &[(&str, &str)] = &[
    (
        "Who are the top contributors?",
        "MATCH (c:Contributor) RETURN c ORDER BY c.commits DESC LIMIT 10",
    ),
    (
        "Which files change most frequently?",
        "MATCH (f:File) RETURN f.path AS path, f.change_count AS change_count ORDER BY f.change_count DESC LIMIT 10",
    ),
    (
        "Show me bug fixing commits",
        "MATCH (c:Commit) WHERE c.is_bug_fix = true RETURN c ORDER BY c.date DESC LIMIT 10",
    ),
    (
        "What did alice commit?",
        "MATCH (a:Contributor)-[:AUTHORED]->(c:Commit) WHERE a.name CONTAINS 'alice' RETURN c ORDER BY c.date DESC LIMIT 10",
    ),
];

pub struct PromptTemplate;

impl PromptTemplate {
    pub fn query_system_prompt() -> &'static str {
        "You translate questions about a git repository into Cypher queries over a \
         knowledge graph. Reply with exactly one read-only query and nothing else. \
         Use a single MATCH with at most one relationship hop, at most one WHERE \
         condition, then RETURN, optionally ORDER BY one property and LIMIT."
    }

    pub fn prose_system_prompt() -> &'static str {
        "You answer questions about a git repository using only the query results \
         provided. Be concise, list the most relevant items first, and do not invent \
         data that is not in the results."
    }

    pub fn query_prompt(schema: &str, question: &str) -> String {
        let mut prompt = String::new();
        prompt.push_str("## Schema\n\n");
        prompt.push_str(schema);
        prompt.push_str("\n\n## Examples\n\n");
        for (q, cypher) in QUERY_EXAMPLES {
            prompt.push_str(&format!("Question: {q}\nQuery: {cypher}\n\n"));
        }
        prompt.push_str(&format!(
            "## Task\n\nQuestion: {question}\nReturn ONLY the Cypher query, no explanation."
        ));
        prompt
    }

    pub fn prose_prompt(question: &str, rows_json: &str) -> String {
        format!(
            "## Question\n\n{question}\n\n## Query Results\n\n```json\n{rows_json}\n```\n\n\
             Answer the question directly from these results."
        )
    }
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```[A-Za-z]*").expect("valid regex"))
}

fn statement_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)\bMATCH\b.*?\bRETURN\b[^\n]*").expect("valid regex"))
}

/// Pull the first `MATCH ... RETURN ...` statement out of a model reply.
///
/// Code fences are stripped first. A statement that is not read-only
/// counts as nothing.
pub fn extract_cypher(reply: &str) -> Option<String> {
    let text = fence_regex().replace_all(reply, "");
    let statement = statement_regex().find(&text)?.as_str();
    let statement = statement
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(';')
        .to_string();
    is_read_only(&statement).then_some(statement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_fenced_reply() {
        let reply = "Here you go:\n```cypher\nMATCH (c:Contributor)\nRETURN c ORDER BY c.commits DESC LIMIT 3;\n```";
        assert_eq!(
            extract_cypher(reply).as_deref(),
            Some("MATCH (c:Contributor) RETURN c ORDER BY c.commits DESC LIMIT 3")
        );
    }

    #[test]
    fn test_extract_rejects_writes_and_prose() {
        assert_eq!(extract_cypher("MATCH (n) DETACH DELETE n RETURN n"), None);
        assert_eq!(
            extract_cypher("MATCH (c:Commit) SET c.x = 1 RETURN c"),
            None
        );
        assert_eq!(extract_cypher("I cannot answer that."), None);
        assert_eq!(extract_cypher("CREATE (n:File {path: 'x'})"), None);
    }

    #[test]
    fn test_query_prompt_carries_schema_and_question() {
        let prompt = PromptTemplate::query_prompt("SCHEMA-TEXT", "Who fixed bugs?");
        assert!(prompt.contains("SCHEMA-TEXT"));
        assert!(prompt.contains("Question: Who fixed bugs?"));
        assert!(prompt.contains("ORDER BY c.commits DESC"));
    }

    #[test]
    fn test_examples_parse_locally() {
        for (_, cypher) in QUERY_EXAMPLES {
            assert!(
                crate::graph::query::parse_cypher(cypher).is_some(),
                "example should parse: {cypher}"
            );
        }
    }
}

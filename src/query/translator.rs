//! Natural-language question to [`QueryPlan`] translation
//!
//! An ordered table of intents is checked against a normalized form of the
//! question. Bengali keywords are rewritten to their English equivalents
//! before matching, so one table serves both languages. When an LLM
//! collaborator is configured it gets the first try; anything it returns
//! that the active backend cannot run is dropped silently.

use crate::ai::LlmCollaborator;
use crate::errors::{RepoChatError, Result};
use crate::graph::query::{is_read_only, parse_cypher};
use crate::graph::schema::SCHEMA_DESCRIPTION;
use crate::graph::{
    BackendKind, Comparison, GraphQuery, HopDirection, NodeLabel, Predicate, QueryPlan, RelType,
    RelativeDate,
};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Question categories, in evaluation order.
///
/// Specific intents come first: a dated commit question must not be
/// swallowed by the generic contributor rule at the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    CommitsOnDate,
    CommitsInPeriod,
    SearchFiles,
    SearchCommits,
    SearchContributors,
    CommitsByAuthor,
    BugFixes,
    RecentCommits,
    MostChangedFiles,
    LargestFiles,
    FilesByLanguage,
    RepositoryOverview,
    TopContributors,
}

impl Intent {
    pub const ALL: [Intent; 13] = [
        Intent::CommitsOnDate,
        Intent::CommitsInPeriod,
        Intent::SearchFiles,
        Intent::SearchCommits,
        Intent::SearchContributors,
        Intent::CommitsByAuthor,
        Intent::BugFixes,
        Intent::RecentCommits,
        Intent::MostChangedFiles,
        Intent::LargestFiles,
        Intent::FilesByLanguage,
        Intent::RepositoryOverview,
        Intent::TopContributors,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Intent::CommitsOnDate => "commits_on_date",
            Intent::CommitsInPeriod => "commits_in_period",
            Intent::SearchFiles => "search_files",
            Intent::SearchCommits => "search_commits",
            Intent::SearchContributors => "search_contributors",
            Intent::CommitsByAuthor => "commits_by_author",
            Intent::BugFixes => "bug_fixes",
            Intent::RecentCommits => "recent_commits",
            Intent::MostChangedFiles => "most_changed_files",
            Intent::LargestFiles => "largest_files",
            Intent::FilesByLanguage => "files_by_language",
            Intent::RepositoryOverview => "repository_overview",
            Intent::TopContributors => "top_contributors",
        }
    }

    /// Phrases that select this intent. Each must start at a word boundary
    /// of the normalized question; a trailing space demands a whole word.
    fn triggers(&self) -> &'static [&'static str] {
        match self {
            Intent::BugFixes => &["bug", "fix", "hotfix", "defect", "issue"],
            Intent::RecentCommits => &[
                "recent", "latest", "newest", "last ", "new commit", "history",
            ],
            Intent::MostChangedFiles => &[
                "most change",
                "changed most",
                "change most",
                "changes most",
                "most modified",
                "modified most",
                "most frequently",
                "frequently changed",
                "change often",
                "changes often",
                "changed often",
                "most edited",
                "hotspot",
                "churn",
                "file changes",
            ],
            Intent::LargestFiles => &[
                "largest",
                "biggest",
                "smallest",
                "shortest",
                "large file",
                "big file",
                "longest",
                "file size",
                "lines of code",
                "most lines",
            ],
            Intent::RepositoryOverview => &[
                "overview",
                "summary",
                "summari",
                "statistics",
                "stats ",
                "repository info",
                "repo info",
                "project info",
                "about this repo",
                "about the repo",
                "about this project",
                "tell me about",
            ],
            Intent::TopContributors => &[
                "contributor",
                "developer",
                "author",
                "committer",
                "programmer",
                "maintainer",
                "who ",
                "most active",
                "people ",
                "top ",
            ],
            // Parameter-driven intents
            _ => &[],
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a bound query came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuerySource {
    Llm,
    Rule,
    /// Nothing matched; the documented default was used
    Default,
}

/// An intent with concrete parameters, ready to execute
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    /// `None` when the plan came from the LLM
    pub intent: Option<Intent>,
    pub plan: QueryPlan,
    pub source: QuerySource,
}

/// Rows shown for the default intent
pub const DEFAULT_LIMIT: usize = 5;
const MAX_LIMIT: usize = 100;

/// Bengali keyword equivalents, applied longest first
const BENGALI_KEYWORDS: &[(&str, &str)] = &[
    ("কে", "who"),
    ("কারা", "who"),
    ("কোন", "which"),
    ("কত", "how many"),
    ("সবচেয়ে বেশি", "most"),
    ("সবচেয়ে কম", "fewest"),
    ("সবচেয়ে ছোট", "smallest"),
    ("বেশি", "more"),
    ("কম", "less"),
    ("কমিট", "commit"),
    ("ফাইল", "file"),
    ("ডেভেলপার", "developer"),
    ("প্রোগ্রামার", "programmer"),
    ("অবদানকারী", "contributor"),
    ("কন্ট্রিবিউটর", "contributor"),
    ("চেঞ্জ", "change"),
    ("পরিবর্তন", "change"),
    ("বাগ", "bug"),
    ("ইস্যু", "issue"),
    ("ফিক্স", "fix"),
    ("কোড", "code"),
    ("লাইন", "line"),
    ("শীর্ষ", "top"),
    ("সেরা", "top"),
    ("সাম্প্রতিক", "recent"),
    ("সর্বশেষ", "latest"),
    ("আজকের", "today"),
    ("আজ", "today"),
    ("এই সপ্তাহের", "this week"),
    ("এই সপ্তাহে", "this week"),
    ("এই মাসের", "this month"),
    ("এই মাসে", "this month"),
    ("এই সপ্তাহ", "this week"),
    ("এই মাস", "this month"),
    ("খুঁজুন", "find"),
    ("খুঁজে", "find"),
    ("খোঁজ", "search"),
    ("সবচেয়ে বড়", "largest"),
    ("বড়", "large"),
    ("রিপোজিটরি", "repository"),
    ("প্রজেক্ট", "project"),
    ("সারসংক্ষেপ", "overview"),
    ("ওভারভিউ", "overview"),
    ("ভাষা", "language"),
];

fn bengali_keywords() -> &'static [(&'static str, &'static str)] {
    static SORTED: OnceLock<Vec<(&'static str, &'static str)>> = OnceLock::new();
    SORTED.get_or_init(|| {
        let mut table = BENGALI_KEYWORDS.to_vec();
        // Longest first so "কমিট" is rewritten before "কম"
        table.sort_by_key(|(bn, _)| std::cmp::Reverse(bn.chars().count()));
        table
    })
}

fn to_ascii_digit(c: char) -> char {
    match c {
        '০'..='৯' => char::from(b'0' + (c as u32 - '০' as u32) as u8),
        _ => c,
    }
}

fn is_bengali(c: char) -> bool {
    ('\u{0980}'..='\u{09FF}').contains(&c)
}

/// Case endings and plural markers a Bengali keyword may carry
const BENGALI_SUFFIXES: &[&str] = &[
    "গুলোর", "গুলির", "গুলো", "গুলি", "দের", "ের", "এর", "তে", "কে", "টি", "টা", "রা", "র", "ে",
];

/// `token` is `keyword`, possibly followed by one case ending.
fn is_inflection_of(token: &str, keyword: &str) -> bool {
    token
        .strip_prefix(keyword)
        .is_some_and(|rest| rest.is_empty() || BENGALI_SUFFIXES.contains(&rest))
}

/// Longest Bengali keyword starting at `tokens[0]`, with the number of
/// tokens it spans. Only the last word of a phrase may be inflected.
fn match_keyword(tokens: &[&str]) -> Option<(&'static str, usize)> {
    bengali_keywords().iter().find_map(|(bn, en)| {
        let parts: Vec<&str> = bn.split(' ').collect();
        let (last, head) = parts.split_last()?;
        if tokens.len() < parts.len() {
            return None;
        }
        let head_matches = head.iter().zip(tokens).all(|(p, t)| p == t);
        (head_matches && is_inflection_of(tokens[head.len()], last)).then_some((*en, parts.len()))
    })
}

/// Lowercase, turn punctuation into spaces, rewrite Bengali digits and
/// whole-word Bengali keywords, and pad with one space on each side.
pub fn normalize(question: &str) -> String {
    let cleaned: String = question
        .to_lowercase()
        .chars()
        .map(to_ascii_digit)
        .map(|c| {
            if c.is_alphanumeric() || is_bengali(c) || matches!(c, '-' | '_' | '.' | '/' | '@') {
                c
            } else {
                ' '
            }
        })
        .collect();
    let tokens: Vec<&str> = cleaned
        .split_whitespace()
        .map(|w| w.trim_matches('.'))
        .filter(|w| !w.is_empty())
        .collect();

    let mut words = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        match match_keyword(&tokens[i..]) {
            Some((en, used)) => {
                words.push(en);
                i += used;
            }
            None => {
                words.push(tokens[i]);
                i += 1;
            }
        }
    }
    format!(" {} ", words.join(" "))
}

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "for", "me", "all", "any", "named", "called", "with", "about", "in", "by",
    "of", "on", "to", "is", "are", "was", "please", "show", "list", "give", "containing",
    "contains", "that", "which", "what", "who", "where", "file", "files", "commit", "commits",
    "contributor", "contributors", "developer", "developers", "author", "authors", "person",
    "people", "message", "messages", "name", "path", "for", "find", "search", "look", "lookup",
    "up", "date", "day", "week", "month", "each", "every", "and",
];

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Words that rank or order results ("largest", "most changed") and
/// so name the intent, never the thing being searched for
const RANKING_WORDS: &[&str] = &[
    "recent", "latest", "newest", "last", "most", "least", "fewest", "largest", "biggest",
    "smallest", "shortest", "longest", "changed", "modified", "edited", "frequently", "top",
];

fn is_search_term(word: &str) -> bool {
    !is_stopword(word) && !RANKING_WORDS.contains(&word)
}

/// Words asking for the low end of a ranking
const ASCENDING_WORDS: &[&str] = &["fewest", "least", "less", "smallest", "lowest", "shortest"];

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("valid regex"))
}

fn threshold_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(more than|greater than|over|above|at least)\s+(\d+)\b").expect("valid regex")
    })
}

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d+)\b").expect("valid regex"))
}

fn quoted_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"["“]([^"”]+)["”]|(?:^|\s)'([^']+)'"#).expect("valid regex")
    })
}

fn search_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(find|search|look for|look up|lookup)\b").expect("valid regex")
    })
}

fn author_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r" commits? (?:by|from|of) (?P<en>\S+)| did (?P<did>\S+) commit| (?P<bn>\S+?)(?:ের|এর|র) commit",
        )
        .expect("valid regex")
    })
}

/// Language names recognized in questions, mapped to the stored value.
const LANGUAGES: &[(&str, &str)] = &[
    ("java", "Java"),
    ("python", "Python"),
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("php", "PHP"),
    ("ruby", "Ruby"),
    ("go", "Go"),
    ("golang", "Go"),
    ("rust", "Rust"),
    ("kotlin", "Kotlin"),
    ("scala", "Scala"),
    ("sql", "SQL"),
    ("xml", "XML"),
    ("json", "JSON"),
    ("yaml", "YAML"),
    ("markdown", "Markdown"),
];

/// Everything the rule table looks at, extracted once per question
#[derive(Debug, Default)]
struct Signals {
    text: String,
    date: Option<String>,
    period: Option<RelativeDate>,
    search_term: Option<String>,
    author: Option<String>,
    limit: Option<usize>,
    threshold: Option<(Comparison, i64)>,
    /// Rank from the bottom ("fewest commits", "smallest files")
    ascending: bool,
    language: Option<&'static str>,
}

impl Signals {
    fn extract(question: &str) -> Self {
        let text = normalize(question);
        let quoted = quoted_regex().captures(question).and_then(|c| {
            c.get(1)
                .or_else(|| c.get(2))
                .map(|m| m.as_str().trim().to_string())
        });

        let date = date_regex().captures(&text).map(|c| c[1].to_string());
        let period = if text.contains(" today ") {
            Some(RelativeDate::Today)
        } else if text.contains(" this week ") {
            Some(RelativeDate::ThisWeek)
        } else if text.contains(" this month ") {
            Some(RelativeDate::ThisMonth)
        } else {
            None
        };

        let threshold = threshold_regex().captures(&text).and_then(|c| {
            let op = if &c[1] == "at least" {
                Comparison::Gte
            } else {
                Comparison::Gt
            };
            c[2].parse::<i64>().ok().map(|n| (op, n))
        });

        // Numbers inside dates and thresholds are not limits
        let without_dates = date_regex().replace_all(&text, " ");
        let without_thresholds = threshold_regex().replace_all(&without_dates, " ");
        let limit = number_regex()
            .captures_iter(&without_thresholds)
            .filter_map(|c| c[1].parse::<usize>().ok())
            .find(|n| (1..=MAX_LIMIT).contains(n));

        let ranking = without_thresholds.replace(" at least ", " ");
        let ascending = ASCENDING_WORDS
            .iter()
            .any(|w| ranking.contains(&format!(" {w} ")));

        let search_term = search_regex().find(&text).and_then(|m| {
            if let Some(q) = &quoted {
                return Some(q.to_lowercase());
            }
            let after = text[m.end()..].split_whitespace().find(|w| is_search_term(w));
            // Bengali puts the object before the verb
            let before = || text[..m.start()].split_whitespace().rev().find(|w| is_search_term(w));
            after.or_else(before).map(str::to_string)
        });

        let author = author_regex().captures(&text).and_then(|c| {
            let name = c
                .name("en")
                .or_else(|| c.name("did"))
                .or_else(|| c.name("bn"))?
                .as_str();
            (!is_stopword(name)).then(|| quoted.clone().unwrap_or_else(|| name.to_string()))
        });

        let language = text.split_whitespace().find_map(|word| {
            LANGUAGES
                .iter()
                .find(|(name, _)| *name == word)
                .map(|(_, canonical)| *canonical)
        });

        Signals {
            text,
            date,
            period,
            search_term,
            author,
            limit,
            threshold,
            ascending,
            language,
        }
    }

    fn has(&self, phrase: &str) -> bool {
        self.text.contains(&format!(" {phrase}"))
    }

    fn has_any(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|p| self.has(p))
    }

    fn limit_or(&self, default: usize) -> usize {
        self.limit.unwrap_or(default)
    }
}

fn recent_commits(limit: usize) -> GraphQuery {
    GraphQuery::new(NodeLabel::Commit)
        .order_by("date", true)
        .limit(limit)
}

/// Bind `intent` against the question, or `None` if it does not apply.
fn bind(intent: Intent, s: &Signals) -> Option<GraphQuery> {
    let query = match intent {
        Intent::CommitsOnDate => {
            let date = s.date.as_deref()?;
            recent_commits(s.limit_or(50)).filter(Predicate::new("date", Comparison::Contains, date))
        }
        Intent::CommitsInPeriod => {
            let period = s.period?;
            recent_commits(s.limit_or(50)).filter(Predicate::since("date", period))
        }
        Intent::SearchFiles => {
            let term = s.search_term.as_deref()?;
            if !s.has_any(&["file", "path"]) {
                return None;
            }
            GraphQuery::new(NodeLabel::File)
                .filter(Predicate::new("path", Comparison::Contains, term))
                .order_by("change_count", true)
                .limit(s.limit_or(20))
        }
        Intent::SearchCommits => {
            let term = s.search_term.as_deref()?;
            if !s.has_any(&["commit", "message"]) {
                return None;
            }
            recent_commits(s.limit_or(20)).filter(Predicate::new("message", Comparison::Contains, term))
        }
        Intent::SearchContributors => {
            let term = s.search_term.as_deref()?;
            GraphQuery::new(NodeLabel::Contributor)
                .filter(Predicate::new("name", Comparison::Contains, term))
                .order_by("commits", true)
                .limit(s.limit_or(20))
        }
        Intent::CommitsByAuthor => {
            let author = s.author.as_deref()?;
            GraphQuery::new(NodeLabel::Contributor)
                .hop(RelType::Authored, NodeLabel::Commit, HopDirection::Outgoing)
                .filter(Predicate::new("name", Comparison::Contains, author))
                .order_by("date", true)
                .limit(s.limit_or(20))
        }
        Intent::BugFixes => {
            if !s.has_any(intent.triggers()) {
                return None;
            }
            recent_commits(s.limit_or(10)).filter(Predicate::new("is_bug_fix", Comparison::Eq, true))
        }
        Intent::RecentCommits => {
            if !s.has_any(intent.triggers()) {
                return None;
            }
            recent_commits(s.limit_or(10))
        }
        Intent::MostChangedFiles => {
            if !s.has_any(intent.triggers()) {
                return None;
            }
            GraphQuery::new(NodeLabel::File)
                .order_by("change_count", true)
                .limit(s.limit_or(10))
        }
        Intent::LargestFiles => {
            let by_threshold = s.threshold.is_some() && s.has("line");
            if !by_threshold && !s.has_any(intent.triggers()) {
                return None;
            }
            let mut query = GraphQuery::new(NodeLabel::File)
                .order_by("lines_of_code", !s.ascending)
                .limit(s.limit_or(10));
            if let Some((op, n)) = s.threshold {
                query = query.filter(Predicate::new("lines_of_code", op, n));
            }
            query
        }
        Intent::FilesByLanguage => {
            let language = s.language?;
            if !s.has_any(&["file", "language", "written", "code"]) {
                return None;
            }
            GraphQuery::new(NodeLabel::File)
                .filter(Predicate::new("language", Comparison::Eq, language))
                .order_by("lines_of_code", true)
                .limit(s.limit_or(20))
        }
        Intent::RepositoryOverview => {
            if !s.has_any(intent.triggers()) {
                return None;
            }
            GraphQuery::new(NodeLabel::Repository)
        }
        Intent::TopContributors => {
            if !s.has_any(intent.triggers()) {
                return None;
            }
            let mut query = GraphQuery::new(NodeLabel::Contributor)
                .order_by("commits", !s.ascending)
                .limit(s.limit_or(10));
            if let Some((op, n)) = s.threshold {
                query = query.filter(Predicate::new("commits", op, n));
            }
            query
        }
    };
    Some(query)
}

/// Deterministic translation through the ordered intent table.
///
/// Returns [`RepoChatError::TranslationFailure`] when no intent applies;
/// [`QueryTranslator::translate`] turns that into the default query.
pub fn match_rules(question: &str) -> Result<BoundQuery> {
    let signals = Signals::extract(question);
    for intent in Intent::ALL {
        if let Some(query) = bind(intent, &signals) {
            debug!("Matched intent {} for {:?}", intent, question);
            return Ok(BoundQuery {
                intent: Some(intent),
                plan: QueryPlan::Structured(query),
                source: QuerySource::Rule,
            });
        }
    }
    Err(RepoChatError::TranslationFailure(format!(
        "no intent matches {question:?}"
    )))
}

/// Ranked contributors, used when nothing else matches.
pub fn default_query() -> BoundQuery {
    BoundQuery {
        intent: Some(Intent::TopContributors),
        plan: QueryPlan::Structured(
            GraphQuery::new(NodeLabel::Contributor)
                .order_by("commits", true)
                .limit(DEFAULT_LIMIT),
        ),
        source: QuerySource::Default,
    }
}

/// Question translator for one backend
pub struct QueryTranslator {
    backend: BackendKind,
    llm: Option<Arc<dyn LlmCollaborator>>,
}

impl QueryTranslator {
    pub fn new(backend: BackendKind) -> Self {
        Self { backend, llm: None }
    }

    pub fn with_llm(mut self, llm: Option<Arc<dyn LlmCollaborator>>) -> Self {
        self.llm = llm;
        self
    }

    /// Translate a question. Never fails: LLM problems fall through to the
    /// rule table, and an unmatched question gets [`default_query`].
    pub fn translate(&self, question: &str) -> BoundQuery {
        if let Some(bound) = self.try_llm(question) {
            return bound;
        }
        match match_rules(question) {
            Ok(bound) => bound,
            Err(e) => {
                debug!("{}; using default intent", e);
                default_query()
            }
        }
    }

    fn try_llm(&self, question: &str) -> Option<BoundQuery> {
        let llm = self.llm.as_ref()?;
        let cypher = match llm.generate_query(SCHEMA_DESCRIPTION, question) {
            Ok(Some(cypher)) => cypher,
            Ok(None) => {
                debug!("LLM returned no usable query");
                return None;
            }
            Err(e) => {
                debug!("LLM query generation failed: {}", e);
                return None;
            }
        };

        let plan = match self.backend {
            // The local store only runs the constrained vocabulary
            BackendKind::Local => QueryPlan::Structured(parse_cypher(&cypher)?),
            BackendKind::Remote if is_read_only(&cypher) => QueryPlan::Cypher(cypher),
            BackendKind::Remote => return None,
        };
        Some(BoundQuery {
            intent: None,
            plan,
            source: QuerySource::Llm,
        })
    }
}

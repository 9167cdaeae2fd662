//! Question answering pipeline: translate, execute, synthesize

pub mod executor;
pub mod synthesizer;
pub mod translator;

pub use executor::{CommitRow, ContributorRow, FileRow, OverviewRow, QueryExecutor, ResultRow};
pub use synthesizer::{render, suggestion, ResponseSynthesizer, DISPLAY_CAP, EXAMPLE_QUESTIONS, NO_RESULTS};
pub use translator::{default_query, match_rules, normalize, BoundQuery, Intent, QuerySource, QueryTranslator};

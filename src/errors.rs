//! Error taxonomy for the question-answering core
//!
//! Only [`RepoChatError::Configuration`] is meant to escape a session as a
//! hard failure. Every other kind is absorbed by [`crate::engine::RepoChat`]
//! and turned into a degraded textual answer.

use crate::graph::GraphError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepoChatError {
    /// Invalid repository path, missing credentials, malformed URI.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Remote graph database could not be reached.
    #[error("Graph backend unavailable: {0}")]
    BackendUnavailable(String),

    /// No intent matched and no LLM produced a usable query.
    #[error("Could not translate question: {0}")]
    TranslationFailure(String),

    /// Malformed or unsupported query shape against a backend.
    #[error("Query execution failed: {0}")]
    QueryExecution(String),

    /// One node or relationship could not be written during a build.
    #[error("Skipped {item} during ingestion: {reason}")]
    PartialIngestion { item: String, reason: String },

    /// Metadata could not be read from the repository.
    #[error("Metadata extraction failed: {0}")]
    Extraction(String),

    /// Top-level build failure (clear or Repository node creation failed).
    #[error("Graph build failed: {0}")]
    Build(String),
}

pub type Result<T> = std::result::Result<T, RepoChatError>;

impl RepoChatError {
    /// Whether this error must be surfaced to the caller instead of being
    /// converted into a fallback answer.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RepoChatError::Configuration(_))
    }
}

impl From<GraphError> for RepoChatError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Unavailable(msg) => RepoChatError::BackendUnavailable(msg),
            GraphError::Config(msg) => RepoChatError::Configuration(msg),
            other => RepoChatError::QueryExecution(other.to_string()),
        }
    }
}

impl From<git2::Error> for RepoChatError {
    fn from(err: git2::Error) -> Self {
        RepoChatError::Extraction(err.message().to_string())
    }
}

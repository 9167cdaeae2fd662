//! Optional LLM collaborator for query generation and answer prose
//!
//! Supports multiple LLM backends (Anthropic, OpenAI and OpenAI-compatible
//! endpoints such as Ollama). Uses BYOK (bring your own key): API keys come
//! from the user config or environment variables.
//!
//! Every caller treats a failure here as "no help available" and falls back
//! to the deterministic rule engine and answer templates.
//!
//! # Environment Variables
//!
//! - `ANTHROPIC_API_KEY`: Required for Anthropic backend
//! - `OPENAI_API_KEY`: Required for OpenAI backend
//!
//! # Example
//!
//! ```rust,ignore
//! use repochat::ai::{AiClient, AiConfig, LlmBackend, LlmCollaborator};
//! use repochat::graph::schema::SCHEMA_DESCRIPTION;
//!
//! let key = std::env::var(LlmBackend::Anthropic.env_key()).ok();
//! let client = AiClient::new(AiConfig::default(), key)?;
//! let cypher = client.generate_query(SCHEMA_DESCRIPTION, "Who are the top contributors?")?;
//! ```

mod client;
mod prompts;

pub use client::{AiClient, AiConfig, LlmBackend, Message, Role};
pub use prompts::{extract_cypher, PromptTemplate};

use thiserror::Error;

/// Errors that can occur in the AI module
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Missing API key: set {env_var} or add it to the config file")]
    MissingApiKey { env_var: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type AiResult<T> = Result<T, AiError>;

/// The two narrow calls the question pipeline makes to a language model.
pub trait LlmCollaborator: Send + Sync {
    /// A read-only Cypher query answering `question`, or `None` when the
    /// reply contains nothing usable.
    fn generate_query(&self, schema: &str, question: &str) -> AiResult<Option<String>>;

    /// Prose answer for `question` given result rows serialized as JSON.
    fn generate_prose(&self, question: &str, rows_json: &str) -> AiResult<String>;
}

//! Chat-completion client for the LLM collaborator
//!
//! Two wire formats cover every backend: the Anthropic messages API and
//! the OpenAI chat-completions API (also spoken by DeepInfra, OpenRouter
//! and a local Ollama). Calls are blocking `ureq` requests.

use crate::ai::prompts::{extract_cypher, PromptTemplate};
use crate::ai::{AiError, AiResult, LlmCollaborator};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmBackend {
    #[default]
    Anthropic,
    OpenAi,
    Deepinfra,
    OpenRouter,
    Ollama,
}

/// Request/response shape a backend speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireFormat {
    Messages,
    ChatCompletions,
}

impl LlmBackend {
    pub fn env_key(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
            LlmBackend::OpenAi => "OPENAI_API_KEY",
            LlmBackend::Deepinfra => "DEEPINFRA_API_KEY",
            LlmBackend::OpenRouter => "OPENROUTER_API_KEY",
            LlmBackend::Ollama => "OLLAMA_MODEL",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "claude-sonnet-4-20250514",
            LlmBackend::OpenAi => "gpt-4o",
            LlmBackend::Deepinfra => "meta-llama/Llama-3.3-70B-Instruct",
            LlmBackend::OpenRouter => "anthropic/claude-sonnet-4",
            LlmBackend::Ollama => "llama3.1:8b",
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "https://api.anthropic.com/v1/messages",
            LlmBackend::OpenAi => "https://api.openai.com/v1/chat/completions",
            LlmBackend::Deepinfra => "https://api.deepinfra.com/v1/openai/chat/completions",
            LlmBackend::OpenRouter => "https://openrouter.ai/api/v1/chat/completions",
            LlmBackend::Ollama => "http://localhost:11434/v1/chat/completions",
        }
    }

    fn wire(&self) -> WireFormat {
        match self {
            LlmBackend::Anthropic => WireFormat::Messages,
            _ => WireFormat::ChatCompletions,
        }
    }

    /// Ollama runs locally without credentials.
    pub fn needs_key(&self) -> bool {
        !matches!(self, LlmBackend::Ollama)
    }

    /// Parse a backend name as written in the config file.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Some(LlmBackend::Anthropic),
            "openai" => Some(LlmBackend::OpenAi),
            "deepinfra" => Some(LlmBackend::Deepinfra),
            "openrouter" => Some(LlmBackend::OpenRouter),
            "ollama" => Some(LlmBackend::Ollama),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "anthropic",
            LlmBackend::OpenAi => "openai",
            LlmBackend::Deepinfra => "deepinfra",
            LlmBackend::OpenRouter => "openrouter",
            LlmBackend::Ollama => "ollama",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub backend: LlmBackend,
    pub model: Option<String>,
    /// Endpoint override, e.g. a proxy or a non-default Ollama port
    pub api_url: Option<String>,
    pub max_tokens: u32,
    /// Zero keeps generated queries stable across runs
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            model: None,
            api_url: None,
            max_tokens: 1024,
            temperature: 0.0,
            timeout: Duration::from_secs(60),
        }
    }
}

impl AiConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }

    pub fn url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or_else(|| self.backend.default_url())
    }
}

/// Blocking chat client implementing [`LlmCollaborator`]
pub struct AiClient {
    config: AiConfig,
    api_key: String,
    agent: ureq::Agent,
}

impl AiClient {
    /// Client for `config.backend`. A backend that needs a key and got
    /// none is [`AiError::MissingApiKey`]; a non-HTTP endpoint is
    /// [`AiError::ConfigError`].
    pub fn new(config: AiConfig, api_key: Option<String>) -> AiResult<Self> {
        let api_key = match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => key,
            None if config.backend.needs_key() => {
                return Err(AiError::MissingApiKey {
                    env_var: config.backend.env_key().to_string(),
                })
            }
            None => String::new(),
        };
        let url = config.url();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AiError::ConfigError(format!("Not an HTTP endpoint: {url}")));
        }

        let agent = ureq::config::Config::builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .build()
            .new_agent();
        Ok(Self {
            config,
            api_key,
            agent,
        })
    }

    pub fn backend(&self) -> LlmBackend {
        self.config.backend
    }

    pub fn model(&self) -> &str {
        self.config.model()
    }

    /// One system + user exchange; returns the reply text.
    pub fn complete(&self, system: &str, prompt: &str) -> AiResult<String> {
        match self.config.backend.wire() {
            WireFormat::Messages => {
                let body = MessagesRequest {
                    model: self.model(),
                    max_tokens: self.config.max_tokens,
                    system,
                    messages: vec![Message::new(Role::User, prompt)],
                    temperature: self.config.temperature,
                };
                let headers = [
                    ("x-api-key", self.api_key.clone()),
                    ("anthropic-version", "2023-06-01".to_string()),
                ];
                let reply: MessagesResponse = self.post(&headers, &body)?;
                reply
                    .content
                    .into_iter()
                    .find(|block| block.kind == "text")
                    .map(|block| block.text)
                    .ok_or_else(|| AiError::ParseError("No text block in reply".to_string()))
            }
            WireFormat::ChatCompletions => {
                let body = ChatRequest {
                    model: self.model(),
                    messages: vec![
                        Message::new(Role::System, system),
                        Message::new(Role::User, prompt),
                    ],
                    max_tokens: self.config.max_tokens,
                    temperature: self.config.temperature,
                };
                let headers: Vec<(&str, String)> = if self.config.backend.needs_key() {
                    vec![("Authorization", format!("Bearer {}", self.api_key))]
                } else {
                    Vec::new()
                };
                let reply: ChatResponse = self.post(&headers, &body)?;
                reply
                    .choices
                    .into_iter()
                    .next()
                    .map(|choice| choice.message.content)
                    .ok_or_else(|| AiError::ParseError("No choices in reply".to_string()))
            }
        }
    }

    fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        headers: &[(&str, String)],
        body: &B,
    ) -> AiResult<R> {
        let mut request = self
            .agent
            .post(self.config.url())
            .header("Content-Type", "application/json");
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        // Transport failures (refused, timeout) carry no HTTP status
        let response = request.send_json(body).map_err(|e| AiError::ApiError {
            status: 0,
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.into_body().read_to_string().unwrap_or_default();
            return Err(AiError::ApiError { status, message });
        }
        response
            .into_body()
            .read_json()
            .map_err(|e| AiError::ParseError(e.to_string()))
    }
}

impl LlmCollaborator for AiClient {
    fn generate_query(&self, schema: &str, question: &str) -> AiResult<Option<String>> {
        let reply = self.complete(
            PromptTemplate::query_system_prompt(),
            &PromptTemplate::query_prompt(schema, question),
        )?;
        let cypher = extract_cypher(&reply);
        debug!(
            "LLM query for {:?}: {}",
            question,
            cypher.as_deref().unwrap_or("<none>")
        );
        Ok(cypher)
    }

    fn generate_prose(&self, question: &str, rows_json: &str) -> AiResult<String> {
        let reply = self.complete(
            PromptTemplate::prose_system_prompt(),
            &PromptTemplate::prose_prompt(question, rows_json),
        )?;
        match reply.trim() {
            "" => Err(AiError::ParseError("Empty prose reply".to_string())),
            text => Ok(text.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

//! User-level configuration for repochat
//!
//! Supports loading config from:
//! - Environment variables
//! - ~/.config/repochat/config.toml

use crate::ai::{AiClient, AiConfig, LlmBackend};
use crate::errors::{RepoChatError, Result};
use crate::graph::{remote::http_endpoint, BuildLimits, Neo4jConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub neo4j: Neo4jSettings,
    #[serde(default)]
    pub ingest: IngestSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AiSettings {
    /// "anthropic" (default), "openai", "deepinfra", "openrouter", "ollama"
    pub backend: Option<String>,

    /// Model override; each backend has its own default
    pub model: Option<String>,

    pub anthropic_api_key: Option<String>,

    pub openai_api_key: Option<String>,

    /// Set to false to always use the rule engine and templates
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Neo4jSettings {
    /// bolt://, neo4j:// or http(s):// URI; unset means local store only
    pub uri: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IngestSettings {
    pub max_commits: Option<usize>,
    pub max_files: Option<usize>,
    pub max_files_per_commit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageSettings {
    pub cache_dir: Option<PathBuf>,
}

impl UserConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/repochat/config.toml)
    pub fn load() -> Result<Self> {
        let path = Self::user_config_path();
        Self::load_from(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Load from an explicit file (if present) and an environment lookup.
    pub fn load_from(path: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = UserConfig::default();

        if let Some(path) = path.filter(|p| p.exists()) {
            let content = std::fs::read_to_string(path).map_err(|e| {
                RepoChatError::Configuration(format!("Cannot read {}: {}", path.display(), e))
            })?;
            let file_config: UserConfig = toml::from_str(&content).map_err(|e| {
                RepoChatError::Configuration(format!("Invalid {}: {}", path.display(), e))
            })?;
            debug!("Loaded user config from {}", path.display());
            config.merge(file_config);
        }

        config.apply_env(env);
        Ok(config)
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("repochat").join("config.toml"))
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.ai.backend, other.ai.backend);
        take(&mut self.ai.model, other.ai.model);
        take(&mut self.ai.anthropic_api_key, other.ai.anthropic_api_key);
        take(&mut self.ai.openai_api_key, other.ai.openai_api_key);
        take(&mut self.ai.enabled, other.ai.enabled);

        take(&mut self.neo4j.uri, other.neo4j.uri);
        take(&mut self.neo4j.user, other.neo4j.user);
        take(&mut self.neo4j.password, other.neo4j.password);
        take(&mut self.neo4j.database, other.neo4j.database);

        take(&mut self.ingest.max_commits, other.ingest.max_commits);
        take(&mut self.ingest.max_files, other.ingest.max_files);
        take(
            &mut self.ingest.max_files_per_commit,
            other.ingest.max_files_per_commit,
        );

        take(&mut self.storage.cache_dir, other.storage.cache_dir);
    }

    /// Environment variables override everything
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("NEO4J_URI") {
            self.neo4j.uri = Some(v);
        }
        if let Some(v) = var("NEO4J_USER") {
            self.neo4j.user = Some(v);
        }
        if let Some(v) = var("NEO4J_PASSWORD") {
            self.neo4j.password = Some(v);
        }
        if let Some(v) = var("NEO4J_DATABASE") {
            self.neo4j.database = Some(v);
        }
        if let Some(v) = var("ANTHROPIC_API_KEY") {
            self.ai.anthropic_api_key = Some(v);
        }
        if let Some(v) = var("OPENAI_API_KEY") {
            self.ai.openai_api_key = Some(v);
        }
        if let Some(v) = var("REPOCHAT_CACHE_DIR") {
            self.storage.cache_dir = Some(PathBuf::from(v));
        }
    }

    /// Remote backend settings, or `None` when no URI is configured.
    ///
    /// A URI without a password, or one that cannot be mapped to an
    /// endpoint, is a configuration error.
    pub fn neo4j_config(&self) -> Result<Option<Neo4jConfig>> {
        let Some(uri) = self.neo4j.uri.as_deref() else {
            return Ok(None);
        };
        let password = self
            .neo4j
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                RepoChatError::Configuration(format!(
                    "Neo4j URI {uri} is set but NEO4J_PASSWORD is missing"
                ))
            })?;

        let mut config = Neo4jConfig::new(
            uri,
            self.neo4j.user.as_deref().unwrap_or("neo4j"),
            password,
        );
        if let Some(db) = &self.neo4j.database {
            config.database = db.clone();
        }
        http_endpoint(&config.uri, &config.database)?;
        Ok(Some(config))
    }

    pub fn build_limits(&self) -> BuildLimits {
        let defaults = BuildLimits::default();
        BuildLimits {
            max_commits: self.ingest.max_commits.unwrap_or(defaults.max_commits),
            max_files: self.ingest.max_files.unwrap_or(defaults.max_files),
            max_files_per_commit: self
                .ingest
                .max_files_per_commit
                .unwrap_or(defaults.max_files_per_commit),
        }
    }

    /// Directory holding graph snapshots
    pub fn cache_root(&self) -> PathBuf {
        self.storage
            .cache_dir
            .clone()
            .unwrap_or_else(crate::cache::default_cache_root)
    }

    pub fn ai_enabled(&self) -> bool {
        self.ai.enabled.unwrap_or(true)
    }

    /// Get the AI backend, defaulting to Anthropic
    pub fn ai_backend(&self) -> Option<LlmBackend> {
        match self.ai.backend.as_deref() {
            None => Some(LlmBackend::Anthropic),
            Some(name) => LlmBackend::parse(name),
        }
    }

    /// API key for a backend: config/env for Anthropic and OpenAI, the
    /// backend's own environment variable otherwise.
    pub fn api_key(&self, backend: LlmBackend) -> Option<String> {
        match backend {
            LlmBackend::Anthropic => self.ai.anthropic_api_key.clone(),
            LlmBackend::OpenAi => self.ai.openai_api_key.clone(),
            LlmBackend::Ollama => Some(String::new()),
            other => std::env::var(other.env_key()).ok(),
        }
    }

    /// Check if AI features are available
    pub fn has_ai_key(&self) -> bool {
        self.ai_backend().and_then(|b| self.api_key(b)).is_some()
    }

    /// The LLM collaborator, when enabled and a key is available.
    pub fn ai_client(&self) -> Option<AiClient> {
        if !self.ai_enabled() {
            return None;
        }
        let Some(backend) = self.ai_backend() else {
            warn!(
                "Unknown AI backend {:?}; using rule-based answers",
                self.ai.backend
            );
            return None;
        };
        let config = AiConfig {
            backend,
            model: self.ai.model.clone(),
            ..Default::default()
        };
        match AiClient::new(config, self.api_key(backend)) {
            Ok(client) => Some(client),
            Err(e) => {
                debug!("AI disabled: {}", e);
                None
            }
        }
    }

    /// Initialize user config directory and create example config
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path().ok_or_else(|| {
            RepoChatError::Configuration("Could not determine config directory".to_string())
        })?;
        Self::init_at(&config_path)?;
        Ok(config_path)
    }

    /// Write the example config to `path` unless a file is already there.
    /// Returns whether a file was written.
    pub fn init_at(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RepoChatError::Configuration(e.to_string()))?;
        }
        std::fs::write(path, EXAMPLE_CONFIG)
            .map_err(|e| RepoChatError::Configuration(e.to_string()))?;
        Ok(true)
    }
}

/// Show the first few characters of a secret only.
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() <= 8 {
        return "****".to_string();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{prefix}****")
}

const EXAMPLE_CONFIG: &str = r#"# repochat user configuration

[ai]
# Backend: "anthropic" (default), "openai", "deepinfra", "openrouter" or "ollama"
# backend = "anthropic"
# model = "claude-sonnet-4-20250514"
# anthropic_api_key = "sk-ant-..."
# openai_api_key = "sk-..."
# Set to false to answer with the built-in rules only
# enabled = true

[neo4j]
# Leave uri unset to use the local snapshot store
# uri = "bolt://localhost:7687"
# user = "neo4j"
# password = "..."
# database = "neo4j"

[ingest]
# max_commits = 1000
# max_files = 5000
# max_files_per_commit = 50

[storage]
# cache_dir = "/path/to/cache"
"#;

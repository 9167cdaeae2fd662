//! Question-answering session over one repository's graph
//!
//! [`RepoChat`] owns the active [`GraphStore`] and wires the translator,
//! executor and synthesizer around it. It also tracks the ingestion state:
//!
//! ```text
//! NotIngested --ingest--> Ingesting --ok--> Ingested
//!                             \--top-level failure--> NotIngested
//! ```
//!
//! A build holds the store for its whole duration but does not block
//! readers: a question asked while a build runs may see a partially built
//! graph. Answers are never corrupt, only incomplete until the build ends.

use crate::ai::LlmCollaborator;
use crate::cache::snapshot_path;
use crate::config::UserConfig;
use crate::errors::{RepoChatError, Result};
use crate::git::GitMetadataExtractor;
use crate::graph::{
    BuildLimits, BuildStats, GraphBuilder, GraphError, GraphStats, GraphStore, LocalGraphStore,
    Neo4jStore,
};
use crate::models::MetadataExtractor;
use crate::query::{
    suggestion, BoundQuery, Intent, QueryExecutor, QuerySource, QueryTranslator,
    ResponseSynthesizer,
};
use chrono::NaiveDate;
use crossbeam_channel::{bounded, Receiver};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    NotIngested,
    Ingesting,
    Ingested,
}

impl IngestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestState::NotIngested => "not ingested",
            IngestState::Ingesting => "ingesting",
            IngestState::Ingested => "ingested",
        }
    }
}

/// Steps a question passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    Received,
    Translated,
    Executed,
    Synthesized,
    /// Execution failed; a templated answer replaced the results
    Fallback,
    Returned,
}

/// Answer text plus how it was produced
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub stages: Vec<QueryStage>,
    pub intent: Option<Intent>,
    pub source: Option<QuerySource>,
}

/// One progress checkpoint from a background ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestProgress {
    pub percent: u8,
    pub message: String,
}

/// How [`RepoChat::open`] picks its collaborators
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    /// Skip the remote backend even when one is configured
    pub force_local: bool,
    /// Allow the LLM collaborator when configured
    pub use_ai: bool,
}

const NOT_INGESTED_HINT: &str =
    "This repository has not been ingested yet. Run `repochat ingest` first.";

pub struct RepoChat {
    store: Arc<dyn GraphStore>,
    llm: Option<Arc<dyn LlmCollaborator>>,
    limits: BuildLimits,
    today: Option<NaiveDate>,
    state: Mutex<IngestState>,
    root: Option<PathBuf>,
    snapshot: Option<PathBuf>,
}

impl RepoChat {
    /// Session over an explicit store. A store that already holds nodes
    /// (a loaded snapshot, a populated database) starts as ingested.
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        let state = match store.stats() {
            Ok(stats) if !stats.is_empty() => IngestState::Ingested,
            Ok(_) => IngestState::NotIngested,
            Err(e) => {
                debug!("Could not read graph stats: {}", e);
                IngestState::NotIngested
            }
        };
        Self {
            store,
            llm: None,
            limits: BuildLimits::default(),
            today: None,
            state: Mutex::new(state),
            root: None,
            snapshot: None,
        }
    }

    pub fn with_llm(mut self, llm: Option<Arc<dyn LlmCollaborator>>) -> Self {
        self.llm = llm;
        self
    }

    pub fn with_limits(mut self, limits: BuildLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Pin the date used for "today", "this week" and "this month".
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Session for the repository at `repo_path` using the user config.
    ///
    /// The remote backend is used when configured and reachable; when it
    /// is unreachable the local snapshot store takes over. Only
    /// configuration problems (bad path, missing password, rejected
    /// credentials) are returned as errors.
    pub fn open(config: &UserConfig, repo_path: &Path, options: OpenOptions) -> Result<Self> {
        let extractor = GitMetadataExtractor::open(repo_path)?;
        let root = extractor.root().to_path_buf();
        let snapshot = snapshot_path(&config.cache_root(), &root);

        let remote = if options.force_local {
            None
        } else {
            config.neo4j_config()?
        };

        let store: Arc<dyn GraphStore> = match remote {
            Some(neo4j) => match Neo4jStore::connect(&neo4j) {
                Ok(store) => Arc::new(store),
                Err(GraphError::Config(msg)) => return Err(RepoChatError::Configuration(msg)),
                Err(e) => {
                    warn!("{}; falling back to the local store", RepoChatError::from(e));
                    Arc::new(LocalGraphStore::open(&snapshot))
                }
            },
            None => Arc::new(LocalGraphStore::open(&snapshot)),
        };
        info!(
            "Using {} backend for {}",
            store.kind().as_str(),
            root.display()
        );

        let llm: Option<Arc<dyn LlmCollaborator>> = if options.use_ai {
            config
                .ai_client()
                .map(|client| Arc::new(client) as Arc<dyn LlmCollaborator>)
        } else {
            None
        };

        let mut chat = Self::new(store)
            .with_llm(llm)
            .with_limits(config.build_limits());
        chat.root = Some(root);
        chat.snapshot = Some(snapshot);
        Ok(chat)
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Snapshot file of the local store for this repository
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    pub fn limits(&self) -> BuildLimits {
        self.limits
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    fn lock_state(&self) -> MutexGuard<'_, IngestState> {
        self.state.lock().expect("ingest state lock poisoned")
    }

    pub fn state(&self) -> IngestState {
        *self.lock_state()
    }

    pub fn stats(&self) -> Result<GraphStats> {
        Ok(self.store.stats()?)
    }

    /// Extract metadata and rebuild the graph.
    ///
    /// A failed extraction leaves the graph and state untouched; a failed
    /// build leaves the session not ingested.
    pub fn ingest(
        &self,
        repository_id: &str,
        extractor: &dyn MetadataExtractor,
        progress: &mut dyn FnMut(u8, &str),
    ) -> Result<BuildStats> {
        let previous = {
            let mut state = self.lock_state();
            let previous = *state;
            *state = IngestState::Ingesting;
            previous
        };

        progress(0, "Extracting repository metadata");
        let metadata = match extractor.extract_metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                *self.lock_state() = previous;
                return Err(e);
            }
        };

        let result = GraphBuilder::new(self.store.as_ref(), self.limits).build(
            repository_id,
            &metadata,
            progress,
        );
        let mut state = self.lock_state();
        match &result {
            Ok(stats) => {
                *state = IngestState::Ingested;
                info!(
                    "Ingested {}: {} nodes, {} relationships",
                    repository_id,
                    stats.nodes(),
                    stats.relationships
                );
            }
            Err(e) => {
                *state = IngestState::NotIngested;
                warn!("Ingestion of {} failed: {}", repository_id, e);
            }
        }
        result
    }

    /// Ingest the repository this session was opened on.
    pub fn ingest_repository(&self, progress: &mut dyn FnMut(u8, &str)) -> Result<BuildStats> {
        let root = self.root.as_deref().ok_or_else(|| {
            RepoChatError::Configuration("Session has no repository path".to_string())
        })?;
        let extractor = GitMetadataExtractor::open(root)?
            .with_limits(self.limits.max_commits, self.limits.max_files);
        let repository_id = extractor.repository_name();
        self.ingest(&repository_id, &extractor, progress)
    }

    /// Run [`RepoChat::ingest`] on a background thread.
    ///
    /// Progress checkpoints arrive on the returned channel, which closes
    /// when the build ends; the join handle carries the result.
    pub fn spawn_ingest<E>(
        self: &Arc<Self>,
        repository_id: String,
        extractor: E,
    ) -> (Receiver<IngestProgress>, JoinHandle<Result<BuildStats>>)
    where
        E: MetadataExtractor + Send + 'static,
    {
        let (tx, rx) = bounded(32);
        let chat = Arc::clone(self);
        let handle = thread::spawn(move || {
            let mut progress = |percent: u8, message: &str| {
                // A dropped receiver just means nobody is watching
                let _ = tx.send(IngestProgress {
                    percent,
                    message: message.to_string(),
                });
            };
            chat.ingest(&repository_id, &extractor, &mut progress)
        });
        (rx, handle)
    }

    /// Answer a question. Never fails; see [`RepoChat::ask_traced`].
    pub fn ask(&self, question: &str) -> String {
        self.ask_traced(question).text
    }

    /// Answer a question and report the stages it went through.
    pub fn ask_traced(&self, question: &str) -> Answer {
        let mut stages = vec![QueryStage::Received];
        let question = question.trim();
        if question.is_empty() {
            stages.extend([QueryStage::Fallback, QueryStage::Returned]);
            return Answer {
                text: suggestion("Please ask a question about the repository."),
                stages,
                intent: None,
                source: None,
            };
        }

        let translator = QueryTranslator::new(self.store.kind()).with_llm(self.llm.clone());
        let mut bound = translator.translate(question);
        stages.push(QueryStage::Translated);

        let executor = QueryExecutor::new(Arc::clone(&self.store)).with_today(self.today);
        let mut result = executor.execute(&bound);
        if result.is_err() && bound.source == QuerySource::Llm {
            // An LLM query the backend rejected; the rule table still applies
            debug!("LLM query failed, retrying with rules");
            bound = QueryTranslator::new(self.store.kind()).translate(question);
            result = executor.execute(&bound);
        }

        let text = match result {
            Ok(rows) => {
                stages.push(QueryStage::Executed);
                let mut text = ResponseSynthesizer::new(self.llm.clone()).synthesize(question, &rows);
                if rows.is_empty() && self.state() == IngestState::NotIngested {
                    text.push_str("\n\n");
                    text.push_str(NOT_INGESTED_HINT);
                }
                stages.push(QueryStage::Synthesized);
                text
            }
            Err(e) => {
                warn!("Could not answer {:?}: {}", question, e);
                stages.push(QueryStage::Fallback);
                fallback_text(&e, &bound)
            }
        };
        stages.push(QueryStage::Returned);

        Answer {
            text,
            stages,
            intent: bound.intent,
            source: Some(bound.source),
        }
    }
}

fn fallback_text(error: &RepoChatError, bound: &BoundQuery) -> String {
    let reason = match error {
        RepoChatError::BackendUnavailable(_) => {
            "The graph database is unavailable right now, so I could not look that up.".to_string()
        }
        _ => match bound.intent {
            Some(intent) => format!("I could not answer that question ({intent} query failed)."),
            None => "I could not answer that question.".to_string(),
        },
    };
    suggestion(&reason)
}

//! Pipeline orchestrator for ragchat.
//!
//! Coordinates ingestion (load, chunk, embed, index) and question answering
//! (retrieve, recall history, prompt, generate, remember).

use crate::chunking::{load_documents, ChunkingConfig, LoadFailure, RecursiveChunker, SourceDocument};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{RagChatError, Result};
use crate::memory::{ChatTurn, ConversationMemory};
use crate::rag::{format_context, Generator, OpenAIGenerator, PromptBuilder, RagAnswer};
use crate::session::SessionContext;
use crate::vector_store::{DiskIndexStore, IndexStore, SearchHit, VectorIndex};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Outcome of one ingestion run.
#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    /// Documents successfully loaded.
    pub documents: usize,
    /// Paths that could not be loaded.
    pub failures: Vec<LoadFailure>,
    /// Chunks embedded and added to the index.
    pub chunks_indexed: usize,
    /// Whether this run created the index rather than extending it.
    pub created: bool,
    /// Total entries in the index after the run.
    pub total_entries: usize,
}

/// The main orchestrator for ragchat.
pub struct Orchestrator {
    settings: Settings,
    prompt: PromptBuilder,
    chunker: RecursiveChunker,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    memory: ConversationMemory,
    index_store: Arc<dyn IndexStore>,
    /// Held from loading the index until it is saved, so ingests never interleave.
    ingest_lock: Mutex<()>,
}

impl Orchestrator {
    /// Create an orchestrator with the OpenAI providers and on-disk storage from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::from_settings(&settings)?);
        let generator: Arc<dyn Generator> = Arc::new(OpenAIGenerator::from_settings(&settings)?);
        let memory = ConversationMemory::from_settings(&settings)?;
        let index_store: Arc<dyn IndexStore> = Arc::new(DiskIndexStore::new(settings.index_dir()));

        info!(
            "Using embedding model {} and generation model {}",
            embedder.model(),
            generator.model()
        );

        Self::with_components(settings, prompts, embedder, generator, memory, index_store)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        memory: ConversationMemory,
        index_store: Arc<dyn IndexStore>,
    ) -> Result<Self> {
        let chunking = ChunkingConfig::from(&settings.chunking);
        chunking.validate()?;

        Ok(Self {
            settings,
            prompt: PromptBuilder::new(prompts),
            chunker: RecursiveChunker::new(chunking),
            embedder,
            generator,
            memory,
            index_store,
            ingest_lock: Mutex::new(()),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn index_location(&self) -> String {
        self.index_store.location()
    }

    /// Load the saved index, if any.
    pub async fn current_index(&self) -> Result<Option<VectorIndex>> {
        if self.index_store.exists().await? {
            Ok(Some(self.index_store.load().await?))
        } else {
            Ok(None)
        }
    }

    /// Load and index a file or directory.
    #[instrument(skip(self))]
    pub async fn ingest_path(&self, path: &Path) -> Result<IngestReport> {
        let outcome = load_documents(path);
        let mut report = self.ingest_documents(outcome.documents).await?;
        report.failures = outcome.failures;
        Ok(report)
    }

    /// Chunk, embed and index already-loaded documents.
    ///
    /// Extends the saved index when one exists, otherwise creates it. Nothing is
    /// written when there is nothing to index. Concurrent calls on one
    /// orchestrator run one at a time.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub async fn ingest_documents(&self, documents: Vec<SourceDocument>) -> Result<IngestReport> {
        let mut report = IngestReport {
            documents: documents.len(),
            ..IngestReport::default()
        };

        let chunks = self.chunker.chunk_documents(&documents);
        if chunks.is_empty() {
            info!("No chunks to index");
            return Ok(report);
        }

        let _guard = self.ingest_lock.lock().await;
        let existing = self.current_index().await?;
        if let Some(index) = &existing {
            index.ensure_model(self.embedder.model())?;
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        info!("Embedding {} chunks", texts.len());
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(RagChatError::provider(
                "Embedding",
                format!("expected {} embeddings, received {}", chunks.len(), embeddings.len()),
                false,
            ));
        }

        report.chunks_indexed = chunks.len();
        let index = match existing {
            Some(mut index) => {
                index.add(chunks, embeddings)?;
                index
            }
            None => {
                report.created = true;
                VectorIndex::build(self.embedder.model(), chunks, embeddings)?
            }
        };

        self.index_store.save(&index).await?;
        report.total_entries = index.len();

        info!(
            "Indexed {} chunks from {} documents ({} total)",
            report.chunks_indexed, report.documents, report.total_entries
        );
        Ok(report)
    }

    /// Retrieve the `k` chunks most similar to `query`.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let query = validate_query(query)?;
        let index = self.load_index().await?;
        self.retrieve(&index, query, k).await
    }

    /// Answer a question in the context of a session, and remember the exchange.
    #[instrument(skip(self, session), fields(session = %session))]
    pub async fn answer(&self, query: &str, session: &SessionContext) -> Result<RagAnswer> {
        let query = validate_query(query)?;
        let index = self.load_index().await?;

        let sources = self.retrieve(&index, query, self.settings.rag.top_k).await?;
        let context = format_context(&sources);
        let history = self
            .memory
            .fetch(session, self.settings.rag.history_turns)
            .await?;

        let prompt = self.prompt.build(&history, &context, query);
        debug!(
            "Prompt has {} context chunks and {} history characters",
            sources.len(),
            history.len()
        );

        let answer = self.generator.generate(&prompt).await?;
        self.memory.append(session, query, answer.clone()).await?;

        Ok(RagAnswer { answer, sources })
    }

    /// Previous turns of a session, oldest first.
    pub async fn history(&self, session: &SessionContext, limit: usize) -> Result<Vec<ChatTurn>> {
        self.memory.turns(session, limit).await
    }

    /// Forget a session's history. Returns the number of turns removed, or `None` on failure.
    pub async fn clear_history(&self, session: &SessionContext) -> Option<usize> {
        self.memory.clear(session).await
    }

    async fn load_index(&self) -> Result<VectorIndex> {
        let index = self.index_store.load().await?;
        index.ensure_model(self.embedder.model())?;
        Ok(index)
    }

    async fn retrieve(&self, index: &VectorIndex, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let query_vector = self.embedder.embed(query).await?;
        let hits = index.search(&query_vector, k)?;
        debug!("Retrieved {} chunks", hits.len());
        Ok(hits)
    }
}

fn validate_query(query: &str) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(RagChatError::InvalidInput("query must not be empty".to_string()));
    }
    Ok(trimmed)
}

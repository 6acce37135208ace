//! The document question-answering service
//!
//! [`Pipeline`] owns every collaborator (extractor registry, embedding store,
//! retriever, answer composer and catalog) and gates all operations on an
//! explicit lifecycle: nothing runs before [`Pipeline::start`] or after
//! [`Pipeline::shutdown`].


use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::chunking::{ChunkingConfig, TextChunk, chunk_document};
use crate::config::Config;
use crate::database::sqlite::models::{DocumentEntry, NewDocument};
use crate::database::{ChunkMetadata, Database, VectorStore};
use crate::embeddings::OllamaClient;
use crate::extract::{DocumentFormat, ExtractorRegistry};
use crate::generation::{AnswerComposer, ChatClient, Generator};
use crate::retrieval::{Retrieval, RetrievalConfig, Retriever, SourceAttribution};
use crate::store::{EmbeddingStore, StoreStats};
use crate::{DocumindError, Result};

/// Answer given when the store holds no documents at all
pub const NO_DOCUMENTS_ANSWER: &str =
    "I don't have any documents uploaded yet. Please upload some documents first.";

/// Extracted text shorter than this (after trimming) counts as empty
const MIN_DOCUMENT_CHARS: usize = 10;

/// Lifecycle of a [`Pipeline`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Uninitialized,
    Ready,
    Closed,
}

/// Why a query could not be answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryErrorCode {
    EmbeddingFailed,
    StoreQueryFailed,
    GenerationFailed,
    ConfigurationMissing,
    NotReady,
    Internal,
}

impl From<&DocumindError> for QueryErrorCode {
    #[inline]
    fn from(error: &DocumindError) -> Self {
        match error.cause() {
            DocumindError::EmbeddingFailed(_) => Self::EmbeddingFailed,
            DocumindError::StoreQueryFailed(_) => Self::StoreQueryFailed,
            DocumindError::GenerationFailed(_) => Self::GenerationFailed,
            DocumindError::ConfigurationMissing(_) => Self::ConfigurationMissing,
            DocumindError::NotReady => Self::NotReady,
            _ => Self::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QueryStatus {
    Answered,
    NoDocuments,
    Failed { code: QueryErrorCode },
}

/// Outcome of [`Pipeline::query_documents`]; always carries a displayable answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceAttribution>,
    pub status: QueryStatus,
}

impl QueryResponse {
    #[inline]
    pub fn no_documents() -> Self {
        Self {
            answer: NO_DOCUMENTS_ANSWER.to_string(),
            sources: Vec::new(),
            status: QueryStatus::NoDocuments,
        }
    }

    #[inline]
    pub fn failed(error: &DocumindError) -> Self {
        Self {
            answer: format!("Error processing query: {}", error),
            sources: Vec::new(),
            status: QueryStatus::Failed {
                code: QueryErrorCode::from(error),
            },
        }
    }

    #[inline]
    pub fn is_answered(&self) -> bool {
        self.status == QueryStatus::Answered
    }
}

enum Answerer {
    Ready(AnswerComposer),
    /// No generator could be built; holds the reason
    Missing(String),
}

pub struct Pipeline {
    state: RwLock<ServiceState>,
    extractors: Arc<ExtractorRegistry>,
    chunking: ChunkingConfig,
    store: Arc<EmbeddingStore>,
    retriever: Retriever,
    answerer: Answerer,
    catalog: Option<Database>,
}

impl Pipeline {
    /// Assemble a pipeline around an opened store. Until a generator is
    /// attached, queries over stored documents fail with `ConfigurationMissing`.
    #[inline]
    pub fn new(store: EmbeddingStore, chunking: ChunkingConfig, retrieval: RetrievalConfig) -> Self {
        let store = Arc::new(store);

        Self {
            state: RwLock::new(ServiceState::Uninitialized),
            extractors: Arc::new(ExtractorRegistry::with_defaults()),
            chunking,
            retriever: Retriever::new(Arc::clone(&store), retrieval),
            store,
            answerer: Answerer::Missing("no answer generator configured".to_string()),
            catalog: None,
        }
    }

    #[inline]
    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.answerer = Answerer::Ready(AnswerComposer::new(generator));
        self
    }

    #[inline]
    pub fn with_catalog(mut self, catalog: Database) -> Self {
        self.catalog = Some(catalog);
        self
    }

    #[inline]
    pub fn with_extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = Arc::new(extractors);
        self
    }

    /// Open the LanceDB store, Ollama embedder, chat client and catalog
    /// described by `config`.
    ///
    /// A missing API key does not prevent uploads; it is reported by each
    /// query that needs an answer.
    #[inline]
    pub async fn from_config(config: &Config) -> Result<Self> {
        let embedder = OllamaClient::new(&config.ollama)?;
        let index = VectorStore::open(&config.vector_database_path()).await?;
        let store = EmbeddingStore::open(Arc::new(embedder), Arc::new(index)).await?;

        let catalog = Database::open(&config.catalog_path())
            .await
            .map_err(|e| DocumindError::Database(format!("{:#}", e)))?;

        let mut pipeline = Self::new(store, config.chunking.clone(), config.retrieval.clone())
            .with_catalog(catalog);

        match ChatClient::new(&config.generation) {
            Ok(client) => pipeline = pipeline.with_generator(Arc::new(client)),
            Err(DocumindError::ConfigurationMissing(reason)) => {
                warn!("Answer generation unavailable: {}", reason);
                pipeline.answerer = Answerer::Missing(reason);
            }
            Err(e) => return Err(e),
        }

        Ok(pipeline)
    }

    /// Mark the pipeline ready. Calling it again while ready is a no-op; a
    /// pipeline that has been shut down cannot be restarted.
    #[inline]
    pub async fn start(&self) -> Result<()> {
        let mut state = self.state.write().await;

        match *state {
            ServiceState::Ready => {
                debug!("Pipeline already running");
                Ok(())
            }
            ServiceState::Closed => Err(DocumindError::NotReady),
            ServiceState::Uninitialized => {
                let stats = self.store.stats().await?;
                *state = ServiceState::Ready;
                info!(
                    "Pipeline ready: collection {} with {} records, embedding model {}",
                    stats.collection,
                    stats.count,
                    self.store.model_name()
                );
                Ok(())
            }
        }
    }

    /// Close the catalog and refuse further work. Idempotent.
    #[inline]
    pub async fn shutdown(&self) {
        let mut state = self.state.write().await;
        if *state == ServiceState::Closed {
            return;
        }

        if let Some(catalog) = &self.catalog {
            catalog.close().await;
        }

        *state = ServiceState::Closed;
        info!("Pipeline shut down");
    }

    #[inline]
    pub async fn state(&self) -> ServiceState {
        *self.state.read().await
    }

    /// Extract, chunk, embed and store a document, returning how many chunks
    /// were stored.
    ///
    /// `filename` becomes the source name shown in answers; the format is
    /// detected from `path`.
    #[inline]
    pub async fn process_upload(&self, path: &Path, filename: &str) -> Result<usize> {
        self.ensure_ready().await?;

        info!("Processing upload {} from {}", filename, path.display());

        let prepared = self
            .prepare(path.to_path_buf())
            .await
            .map_err(|source| DocumindError::ProcessingFailed {
                filename: filename.to_string(),
                source: Box::new(source),
            })?;

        let chunk_count = prepared.chunks.len();
        let total_chunks = u32::try_from(chunk_count).map_err(|_| {
            DocumindError::StoreWriteFailed(format!("{} chunks exceed the index limit", chunk_count))
        })?;

        let mut texts = Vec::with_capacity(chunk_count);
        let mut metadatas = Vec::with_capacity(chunk_count);
        for (chunk_index, chunk) in (0..total_chunks).zip(prepared.chunks) {
            texts.push(chunk.content);
            metadatas.push(ChunkMetadata {
                source: filename.to_string(),
                chunk_index,
                total_chunks,
            });
        }

        self.store.add(texts, metadatas).await?;

        if let Some(catalog) = &self.catalog {
            let entry = NewDocument {
                filename: filename.to_string(),
                format: prepared.format.as_str().to_string(),
                size_bytes: i64::try_from(prepared.size_bytes).unwrap_or(i64::MAX),
                chunk_count: i64::from(total_chunks),
            };
            catalog
                .record_document(&entry)
                .await
                .map_err(|e| DocumindError::Database(format!("{:#}", e)))?;
        }

        info!("Stored {} chunks for {}", chunk_count, filename);
        Ok(chunk_count)
    }

    /// Answer a question from the stored documents. Never fails: problems are
    /// reported through [`QueryStatus::Failed`].
    #[inline]
    pub async fn query_documents(&self, question: &str) -> QueryResponse {
        match self.answer(question).await {
            Ok(response) => response,
            Err(e) => {
                error!("Query failed: {}", e);
                QueryResponse::failed(&e)
            }
        }
    }

    #[inline]
    pub async fn stats(&self) -> Result<StoreStats> {
        self.ensure_ready().await?;
        self.store.stats().await
    }

    /// Catalog entries, most recent upload first. Empty without a catalog.
    #[inline]
    pub async fn list_documents(&self) -> Result<Vec<DocumentEntry>> {
        self.ensure_ready().await?;

        match &self.catalog {
            Some(catalog) => catalog
                .list_documents()
                .await
                .map_err(|e| DocumindError::Database(format!("{:#}", e))),
            None => {
                debug!("No catalog attached; nothing to list");
                Ok(Vec::new())
            }
        }
    }

    async fn answer(&self, question: &str) -> Result<QueryResponse> {
        self.ensure_ready().await?;

        let (context, sources) = match self.retriever.retrieve(question).await? {
            Retrieval::NoDocuments => return Ok(QueryResponse::no_documents()),
            Retrieval::Found { context, sources } => (context, sources),
        };

        let composer = match &self.answerer {
            Answerer::Ready(composer) => composer,
            Answerer::Missing(reason) => {
                return Err(DocumindError::ConfigurationMissing(reason.clone()));
            }
        };

        let answer = composer.answer(question, &context).await?;

        Ok(QueryResponse {
            answer,
            sources,
            status: QueryStatus::Answered,
        })
    }

    /// Extraction and chunking, off the async runtime
    async fn prepare(&self, path: PathBuf) -> Result<PreparedDocument> {
        let extractors = Arc::clone(&self.extractors);
        let chunking = self.chunking.clone();

        tokio::task::spawn_blocking(move || {
            let format = DocumentFormat::from_path(&path)?;
            let size_bytes = std::fs::metadata(&path)
                .map_err(|e| format.failure(e))?
                .len();
            let text = extractors.extract(&path)?;

            if text.trim().chars().count() < MIN_DOCUMENT_CHARS {
                return Err(DocumindError::EmptyDocument);
            }

            let chunks = chunk_document(&text, &chunking);
            if chunks.is_empty() {
                return Err(DocumindError::NoChunksProduced);
            }

            Ok(PreparedDocument {
                format,
                size_bytes,
                chunks,
            })
        })
        .await
        .map_err(|e| DocumindError::Other(anyhow::anyhow!("Extraction task failed: {}", e)))?
    }

    async fn ensure_ready(&self) -> Result<()> {
        if *self.state.read().await == ServiceState::Ready {
            Ok(())
        } else {
            Err(DocumindError::NotReady)
        }
    }
}

struct PreparedDocument {
    format: DocumentFormat,
    size_bytes: u64,
    chunks: Vec<TextChunk>,
}


use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use crate::database::{ChunkMetadata, EmbeddingRecord, SearchHit, VectorIndex};
use crate::embeddings::{Embedder, l2_normalize};
use crate::{DocumindError, Result};

const ACTIVE_STATUS: &str = "active";

/// Snapshot of the vector collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub count: u64,
    pub status: String,
    pub collection: String,
}

/// Embeds chunks and keeps them in a vector index under `doc_<n>` ids.
///
/// Opening the store is the only readiness step: it reads the index size once
/// and seeds the id counter from it. Ids are reserved atomically, so concurrent
/// `add` calls on one store never hand out the same id.
pub struct EmbeddingStore {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    next_id: AtomicU64,
}

impl EmbeddingStore {
    #[inline]
    pub async fn open(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Result<Self> {
        let count = index.count().await?;

        info!(
            "Embedding store ready: collection {} with {} records, model {}",
            index.collection(),
            count,
            embedder.model_name()
        );

        Ok(Self {
            embedder,
            index,
            next_id: AtomicU64::new(count),
        })
    }

    /// One unit-length vector per input, in input order
    #[inline]
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = self.embedder.embed(texts).await?;

        if vectors.len() != texts.len() {
            return Err(DocumindError::EmbeddingFailed(format!(
                "expected {} vectors, model returned {}",
                texts.len(),
                vectors.len()
            )));
        }

        for vector in &mut vectors {
            l2_normalize(vector);
        }

        Ok(vectors)
    }

    /// Embed `chunks` and persist them with their metadata, returning the new
    /// ids. Records already written are not rolled back if a later step fails.
    #[inline]
    pub async fn add(&self, chunks: Vec<String>, metadatas: Vec<ChunkMetadata>) -> Result<Vec<String>> {
        if chunks.len() != metadatas.len() {
            return Err(DocumindError::StoreWriteFailed(format!(
                "{} chunks but {} metadata entries",
                chunks.len(),
                metadatas.len()
            )));
        }

        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self.embed_batch(&chunks).await?;
        let ids = self.reserve_ids(chunks.len());

        let records: Vec<EmbeddingRecord> = ids
            .iter()
            .zip(vectors)
            .zip(chunks.into_iter().zip(metadatas))
            .map(|((id, vector), (document, metadata))| EmbeddingRecord {
                id: id.clone(),
                vector,
                document,
                metadata,
            })
            .collect();

        self.index.add(records).await?;

        debug!("Added {} chunks to {}", ids.len(), self.index.collection());
        Ok(ids)
    }

    /// The `k` stored chunks closest to `text`, closest first
    #[inline]
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 || self.index.count().await? == 0 {
            debug!("Nothing to search in {}", self.index.collection());
            return Ok(Vec::new());
        }

        let mut vector = self.embedder.embed_one(text).await?;
        l2_normalize(&mut vector);

        self.index.query(&vector, k).await
    }

    #[inline]
    pub async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            count: self.index.count().await?,
            status: ACTIVE_STATUS.to_string(),
            collection: self.index.collection().to_string(),
        })
    }

    #[inline]
    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    fn reserve_ids(&self, n: usize) -> Vec<String> {
        let first = self.next_id.fetch_add(n as u64, Ordering::SeqCst);
        (first..first + n as u64)
            .map(|id| format!("doc_{}", id))
            .collect()
    }
}

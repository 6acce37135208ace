use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{EmbeddingRecord, SearchHit, VectorIndex, cosine_distance};
use crate::{DocumindError, Result};

const DEFAULT_COLLECTION: &str = "documind_collection";

/// Brute-force vector index kept entirely in memory.
///
/// Searches compare the query against every record, so this is meant for
/// tests and small embedded uses rather than large collections.
#[derive(Debug)]
pub struct MemoryIndex {
    name: String,
    records: RwLock<Vec<EmbeddingRecord>>,
}

impl MemoryIndex {
    #[inline]
    pub fn new() -> Self {
        Self::with_name(DEFAULT_COLLECTION)
    }

    #[inline]
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of every stored record in insertion order
    #[inline]
    pub async fn records(&self) -> Vec<EmbeddingRecord> {
        self.records.read().await.clone()
    }
}

impl Default for MemoryIndex {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    #[inline]
    async fn add(&self, records: Vec<EmbeddingRecord>) -> Result<()> {
        let mut stored = self.records.write().await;

        let dimension = stored
            .first()
            .or_else(|| records.first())
            .map(|record| record.vector.len());

        if let Some(dimension) = dimension {
            if let Some(mismatch) = records.iter().find(|r| r.vector.len() != dimension) {
                return Err(DocumindError::StoreWriteFailed(format!(
                    "vector for {} has dimension {}, collection uses {}",
                    mismatch.id,
                    mismatch.vector.len(),
                    dimension
                )));
            }
        }

        debug!("Adding {} records to memory index", records.len());
        stored.extend(records);
        Ok(())
    }

    #[inline]
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let stored = self.records.read().await;

        if let Some(first) = stored.first() {
            if first.vector.len() != vector.len() {
                return Err(DocumindError::StoreQueryFailed(format!(
                    "query vector has dimension {}, collection uses {}",
                    vector.len(),
                    first.vector.len()
                )));
            }
        }

        let mut scored: Vec<(f32, &EmbeddingRecord)> = stored
            .iter()
            .map(|record| (cosine_distance(vector, &record.vector), record))
            .collect();

        // Stable sort: equal distances keep insertion order
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(distance, record)| SearchHit {
                document: record.document.clone(),
                metadata: record.metadata.clone(),
                distance,
            })
            .collect())
    }

    #[inline]
    async fn count(&self) -> Result<u64> {
        Ok(self.records.read().await.len() as u64)
    }

    #[inline]
    fn collection(&self) -> &str {
        &self.name
    }
}

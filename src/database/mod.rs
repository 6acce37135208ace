// Storage: the vector index seam with its LanceDB and in-memory backends,
// plus the SQLite document catalog

pub mod lancedb;
pub mod memory;
pub mod sqlite;


use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

pub use self::lancedb::VectorStore;
pub use memory::MemoryIndex;
pub use sqlite::Database;

/// Where a stored chunk came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Filename of the uploaded document
    pub source: String,
    /// Zero-based position of the chunk within its document
    pub chunk_index: u32,
    /// Number of chunks the document produced
    pub total_chunks: u32,
}

/// One embedded chunk as persisted in the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// `doc_<n>`, unique within the index
    pub id: String,
    pub vector: Vec<f32>,
    /// The chunk text
    pub document: String,
    pub metadata: ChunkMetadata,
}

/// A nearest-neighbour match, closest first
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub document: String,
    pub metadata: ChunkMetadata,
    /// Cosine distance: 0 for identical direction, up to 2 for opposite
    pub distance: f32,
}

/// Persistent nearest-neighbour index over embedding records
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Append records. All vectors in an index share one dimension.
    async fn add(&self, records: Vec<EmbeddingRecord>) -> Result<()>;

    /// Up to `k` records ordered by ascending distance to `vector`
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>>;

    async fn count(&self) -> Result<u64>;

    /// Name of the collection backing this index
    fn collection(&self) -> &str;
}

/// Cosine distance between two vectors of equal length. Zero vectors are
/// treated as maximally dissimilar from everything.
#[inline]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 1.0;
    }

    1.0 - dot / (norm_a * norm_b)
}

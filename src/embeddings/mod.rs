// Embedding model seam and the Ollama adapter

pub mod ollama;


use async_trait::async_trait;

use crate::{DocumindError, Result};

pub use ollama::OllamaClient;

/// Turns text into fixed-length vectors.
///
/// Implementations must preserve input order and return one vector per input.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    #[inline]
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| DocumindError::EmbeddingFailed("model returned no vector".to_string()))
    }

    fn model_name(&self) -> &str;
}

/// Scale `vector` to unit length in place. Zero vectors are left untouched.
#[inline]
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

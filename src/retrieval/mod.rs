#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::Result;
use crate::database::SearchHit;
use crate::store::EmbeddingStore;

const CONTEXT_SEPARATOR: &str = "\n---\n";
const PREVIEW_ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks fetched per question
    pub top_k: usize,
    /// Characters of chunk text shown in a source preview
    pub preview_chars: usize,
}

impl Default for RetrievalConfig {
    #[inline]
    fn default() -> Self {
        Self {
            top_k: 5,
            preview_chars: 150,
        }
    }
}

/// Which document an answer drew on, and how closely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAttribution {
    pub filename: String,
    /// Index of the best-ranked chunk from this document
    pub chunk_index: u32,
    /// `1 - distance`, rounded to three decimals
    pub relevance_score: f64,
    pub preview: String,
}

/// Outcome of a similarity lookup for a question
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    /// The store holds nothing relevant to search
    NoDocuments,
    Found {
        context: String,
        sources: Vec<SourceAttribution>,
    },
}

pub struct Retriever {
    store: Arc<EmbeddingStore>,
    config: RetrievalConfig,
}

impl Retriever {
    #[inline]
    pub fn new(store: Arc<EmbeddingStore>, config: RetrievalConfig) -> Self {
        Self { store, config }
    }

    #[inline]
    pub async fn retrieve(&self, question: &str) -> Result<Retrieval> {
        let hits = self.store.query(question, self.config.top_k).await?;

        if hits.is_empty() {
            debug!("No stored chunks matched the question");
            return Ok(Retrieval::NoDocuments);
        }

        debug!("Retrieved {} chunks for question", hits.len());

        Ok(Retrieval::Found {
            context: format_context(&hits),
            sources: extract_sources(&hits, self.config.preview_chars),
        })
    }
}

/// Render hits, in ranking order, as labelled blocks separated by `---` lines
#[inline]
pub fn format_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| {
            format!(
                "[Source: {}, Part {}]\n{}\n",
                hit.metadata.source,
                u64::from(hit.metadata.chunk_index) + 1,
                hit.document
            )
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// One attribution per distinct filename, taken from its best-ranked hit
#[inline]
pub fn extract_sources(hits: &[SearchHit], preview_chars: usize) -> Vec<SourceAttribution> {
    let mut seen = HashSet::new();

    hits.iter()
        .filter(|hit| seen.insert(hit.metadata.source.as_str()))
        .map(|hit| SourceAttribution {
            filename: hit.metadata.source.clone(),
            chunk_index: hit.metadata.chunk_index,
            relevance_score: relevance_score(hit.distance),
            preview: preview(&hit.document, preview_chars),
        })
        .collect()
}

/// `1 - distance`, rounded half away from zero to three decimals
#[inline]
pub fn relevance_score(distance: f32) -> f64 {
    ((1.0 - f64::from(distance)) * 1000.0).round() / 1000.0
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();

    if chars.next().is_some() {
        head + PREVIEW_ELLIPSIS
    } else {
        head
    }
}


use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::debug;

/// Configuration for text chunking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive windows
    pub overlap: usize,
    /// Chunks at or below this many characters (after trimming) are dropped
    pub min_chunk_chars: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
            min_chunk_chars: 50,
        }
    }
}

/// A chunk of a document's extracted text, tagged with its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// Split text into overlapping chunks, preferring to end each window at a
/// sentence terminator or newline in its second half.
///
/// Chunking is pure: the same text and configuration always produce the same
/// sequence. Empty or whitespace-only text produces no chunks.
#[inline]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();

    let chunks: Vec<String> = windows(&chars, config)
        .into_iter()
        .map(|range| chars[range].iter().collect::<String>().trim().to_string())
        .filter(|chunk| chunk.chars().count() > config.min_chunk_chars)
        .collect();

    debug!(
        "Chunked {} characters into {} chunks (size {}, overlap {})",
        chars.len(),
        chunks.len(),
        config.chunk_size,
        config.overlap
    );

    chunks
}

/// Chunk text and attach each chunk's index and the document's chunk total
#[inline]
pub fn chunk_document(text: &str, config: &ChunkingConfig) -> Vec<TextChunk> {
    let chunks = chunk_text(text, config);
    let total_chunks = chunks.len();

    chunks
        .into_iter()
        .enumerate()
        .map(|(chunk_index, content)| TextChunk {
            content,
            chunk_index,
            total_chunks,
        })
        .collect()
}

/// Compute the raw character windows, before trimming and filtering
fn windows(chars: &[char], config: &ChunkingConfig) -> Vec<Range<usize>> {
    let len = chars.len();
    let chunk_size = config.chunk_size.max(1);
    let mut ranges = Vec::new();
    let mut start = 0;

    while start < len {
        let mut end = (start + chunk_size).min(len);

        if end < len {
            if let Some(boundary) = last_boundary(&chars[start..end]) {
                // Only honour the boundary once the window is more than half full
                if boundary * 2 > chunk_size {
                    end = start + boundary + 1;
                }
            }
        }

        ranges.push(start..end);

        if end >= len {
            break;
        }

        start = end.saturating_sub(config.overlap).max(start + 1);
    }

    ranges
}

/// Position of the last `.` or newline within a window
fn last_boundary(window: &[char]) -> Option<usize> {
    window.iter().rposition(|&c| c == '.' || c == '\n')
}

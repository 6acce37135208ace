use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocumindError>;

#[derive(Error, Debug)]
pub enum DocumindError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Error reading {format}: {message}")]
    ExtractionFailed { format: String, message: String },

    #[error("Document appears to be empty or unreadable")]
    EmptyDocument,

    #[error("No valid text chunks created from document")]
    NoChunksProduced,

    #[error("Failed to process document {filename}: {source}")]
    ProcessingFailed {
        filename: String,
        #[source]
        source: Box<DocumindError>,
    },

    #[error("Error creating embeddings: {0}")]
    EmbeddingFailed(String),

    #[error("Error adding to vector store: {0}")]
    StoreWriteFailed(String),

    #[error("Error querying vector store: {0}")]
    StoreQueryFailed(String),

    #[error("Error generating answer: {0}")]
    GenerationFailed(String),

    #[error("Missing configuration: {0}")]
    ConfigurationMissing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Pipeline is not running; call start() first")]
    NotReady,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl DocumindError {
    /// The innermost pipeline error, looking through `ProcessingFailed` wrappers
    #[inline]
    pub fn cause(&self) -> &Self {
        match self {
            Self::ProcessingFailed { source, .. } => source.cause(),
            other => other,
        }
    }
}

pub mod chunking;
pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod extract;
pub mod generation;
mod http;
pub mod pipeline;
pub mod retrieval;
pub mod store;

#[cfg(test)]
mod testing;

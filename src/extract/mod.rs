//! Text extraction for uploaded documents
//!
//! Each supported [`DocumentFormat`] maps to an [`ExtractionStrategy`] in an
//! [`ExtractorRegistry`]. Supporting a new format means registering a strategy
//! for it; dispatch itself never changes.


mod docx;
mod ooxml;
mod pdf;
mod pptx;
mod text;
mod xlsx;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::{DocumindError, Result};

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;
pub use pptx::PptxExtractor;
pub use text::TextExtractor;
pub use xlsx::XlsxExtractor;

/// Document formats understood by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Xlsx,
    Pptx,
    Txt,
}

impl DocumentFormat {
    /// Detect a format from a file extension, ignoring case.
    ///
    /// Legacy Office extensions map onto their OpenXML readers.
    #[inline]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" | "doc" => Some(Self::Docx),
            "xlsx" | "xls" => Some(Self::Xlsx),
            "pptx" | "ppt" => Some(Self::Pptx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Detect the format of a file from its path
    #[inline]
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        Self::from_extension(extension).ok_or_else(|| {
            DocumindError::UnsupportedFormat(if extension.is_empty() {
                "(none)".to_string()
            } else {
                format!(".{}", extension.to_ascii_lowercase())
            })
        })
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Pptx => "pptx",
            Self::Txt => "txt",
        }
    }

    /// Human readable name used in error messages
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Xlsx => "Excel",
            Self::Pptx => "PowerPoint",
            Self::Txt => "TXT",
        }
    }

    /// Build an `ExtractionFailed` error for this format
    #[inline]
    pub fn failure(self, cause: impl fmt::Display) -> DocumindError {
        DocumindError::ExtractionFailed {
            format: self.label().to_string(),
            message: cause.to_string(),
        }
    }
}

impl fmt::Display for DocumentFormat {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A format-specific way of turning a file into plain text
pub trait ExtractionStrategy: Send + Sync {
    /// Read the whole file and return its text
    fn extract(&self, path: &Path) -> Result<String>;
}

/// Lookup table from document format to extraction strategy
pub struct ExtractorRegistry {
    strategies: HashMap<DocumentFormat, Box<dyn ExtractionStrategy>>,
}

impl ExtractorRegistry {
    /// Create an empty registry
    #[inline]
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Create a registry with every built-in strategy registered
    #[inline]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(DocumentFormat::Pdf, PdfExtractor);
        registry.register(DocumentFormat::Docx, DocxExtractor);
        registry.register(DocumentFormat::Xlsx, XlsxExtractor);
        registry.register(DocumentFormat::Pptx, PptxExtractor);
        registry.register(DocumentFormat::Txt, TextExtractor);
        registry
    }

    /// Register (or replace) the strategy for a format
    #[inline]
    pub fn register<S>(&mut self, format: DocumentFormat, strategy: S)
    where
        S: ExtractionStrategy + 'static,
    {
        debug!("Registered extraction strategy for {}", format);
        self.strategies.insert(format, Box::new(strategy));
    }

    #[inline]
    pub fn supports(&self, format: DocumentFormat) -> bool {
        self.strategies.contains_key(&format)
    }

    /// Extract the text of a file, dispatching on its extension
    #[inline]
    pub fn extract(&self, path: &Path) -> Result<String> {
        let format = DocumentFormat::from_path(path)?;
        let strategy = self
            .strategies
            .get(&format)
            .ok_or_else(|| DocumindError::UnsupportedFormat(format!(".{}", format)))?;

        debug!("Extracting {} as {}", path.display(), format);
        let text = strategy.extract(path)?;
        info!(
            "Extracted {} characters from {}",
            text.chars().count(),
            path.display()
        );

        Ok(text)
    }
}

impl Default for ExtractorRegistry {
    #[inline]
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Extract text from a file using the built-in strategies
#[inline]
pub fn extract(path: &Path) -> Result<String> {
    ExtractorRegistry::with_defaults().extract(path)
}

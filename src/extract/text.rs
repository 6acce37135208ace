use std::fs;
use std::path::Path;

use super::{DocumentFormat, ExtractionStrategy};
use crate::Result;

/// Plain UTF-8 text files, read verbatim
pub struct TextExtractor;

impl ExtractionStrategy for TextExtractor {
    #[inline]
    fn extract(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|e| DocumentFormat::Txt.failure(e))?;
        String::from_utf8(bytes).map_err(|e| DocumentFormat::Txt.failure(e))
    }
}

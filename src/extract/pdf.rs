use lopdf::Document;
use std::path::Path;
use tracing::{debug, warn};

use super::{DocumentFormat, ExtractionStrategy};
use crate::Result;

/// PDF documents, read page by page with lopdf
pub struct PdfExtractor;

impl ExtractionStrategy for PdfExtractor {
    #[inline]
    fn extract(&self, path: &Path) -> Result<String> {
        let doc = Document::load(path).map_err(|e| DocumentFormat::Pdf.failure(e))?;

        let pages = doc.get_pages();
        debug!("Extracting text from {} PDF pages", pages.len());

        let page_texts = pages.keys().map(|&page_number| {
            let text = match doc.extract_text(&[page_number]) {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!("Failed to extract text from page {}: {}", page_number, e);
                    None
                }
            };
            (page_number, text)
        });

        Ok(assemble_pages(page_texts))
    }
}

/// Join page texts under page markers, skipping pages without text
pub(super) fn assemble_pages<I>(pages: I) -> String
where
    I: IntoIterator<Item = (u32, Option<String>)>,
{
    let mut text = String::new();

    for (page_number, page_text) in pages {
        let Some(page_text) = page_text else {
            continue;
        };
        if page_text.is_empty() {
            continue;
        }

        text.push_str("\n--- Page ");
        text.push_str(&page_number.to_string());
        text.push_str(" ---\n");
        text.push_str(&page_text);
    }

    text
}

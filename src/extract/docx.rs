use quick_xml::Reader;
use quick_xml::events::Event;
use std::path::Path;

use super::ooxml::{open_package, read_part};
use super::{DocumentFormat, ExtractionStrategy};
use crate::Result;

const DOCUMENT_PART: &str = "word/document.xml";

/// Word documents: body paragraphs, one per line
pub struct DocxExtractor;

impl ExtractionStrategy for DocxExtractor {
    #[inline]
    fn extract(&self, path: &Path) -> Result<String> {
        let mut archive = open_package(path, DocumentFormat::Docx)?;
        let xml = read_part(&mut archive, DOCUMENT_PART, DocumentFormat::Docx)?;
        document_text(&xml)
    }
}

/// Collect the text of every non-blank body paragraph.
///
/// Paragraphs inside tables and nested paragraphs (text boxes) are not part
/// of the body flow and are skipped.
pub(super) fn document_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut paragraph = String::new();
    let mut paragraph_depth = 0usize;
    let mut table_depth = 0usize;
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DocumentFormat::Docx.failure(e))?;

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:p" => {
                    paragraph_depth += 1;
                    if paragraph_depth == 1 {
                        paragraph.clear();
                    }
                }
                b"w:r" => run_depth += 1,
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => {
                let collecting = table_depth == 0 && paragraph_depth == 1 && run_depth > 0;
                match e.name().as_ref() {
                    b"w:tab" if collecting => paragraph.push('\t'),
                    b"w:br" | b"w:cr" if collecting => paragraph.push('\n'),
                    _ => {}
                }
            }
            Event::Text(t) => {
                if in_text && table_depth == 0 && paragraph_depth == 1 {
                    let content = t.unescape().map_err(|e| DocumentFormat::Docx.failure(e))?;
                    paragraph.push_str(&content);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:p" => {
                    if paragraph_depth == 1 && table_depth == 0 && !paragraph.trim().is_empty() {
                        text.push_str(&paragraph);
                        text.push('\n');
                    }
                    paragraph_depth = paragraph_depth.saturating_sub(1);
                }
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

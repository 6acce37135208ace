use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};
use zip::ZipArchive;

use super::ooxml::{open_package, read_part};
use super::{DocumentFormat, ExtractionStrategy};
use crate::Result;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";

/// PowerPoint decks: slide by slide, one text shape per line
pub struct PptxExtractor;

impl ExtractionStrategy for PptxExtractor {
    #[inline]
    fn extract(&self, path: &Path) -> Result<String> {
        let mut archive = open_package(path, DocumentFormat::Pptx)?;
        let slides = slide_parts(&mut archive)?;

        let mut text = String::new();
        for (position, part) in slides.iter().enumerate() {
            let xml = read_part(&mut archive, part, DocumentFormat::Pptx)?;

            text.push_str("\n--- Slide ");
            text.push_str(&(position + 1).to_string());
            text.push_str(" ---\n");

            for shape in shape_texts(&xml)? {
                text.push_str(&shape);
                text.push('\n');
            }
        }

        Ok(text)
    }
}

/// Slide parts in presentation order.
///
/// The order comes from `<p:sldIdLst>` in the presentation part, resolved
/// through its relationships. Packages without a presentation part fall back
/// to the numbers in the slide part names.
fn slide_parts(archive: &mut ZipArchive<File>) -> Result<Vec<String>> {
    let has_part = |name: &str| archive.file_names().any(|part| part == name);
    let ordered = has_part(PRESENTATION_PART) && has_part(PRESENTATION_RELS_PART);

    if !ordered {
        debug!("No presentation part; ordering slides by part name");
        let mut slides: Vec<(u32, String)> = archive
            .file_names()
            .filter_map(|name| slide_number(name).map(|number| (number, name.to_string())))
            .collect();
        slides.sort_unstable();
        return Ok(slides.into_iter().map(|(_, part)| part).collect());
    }

    let presentation = read_part(archive, PRESENTATION_PART, DocumentFormat::Pptx)?;
    let relationships = read_part(archive, PRESENTATION_RELS_PART, DocumentFormat::Pptx)?;
    let targets = relationship_targets(&relationships)?;

    Ok(slide_relationship_ids(&presentation)?
        .into_iter()
        .filter_map(|id| {
            let target = targets.get(&id);
            if target.is_none() {
                warn!("Slide relationship {} has no target; skipping", id);
            }
            target.map(|target| resolve_target(target))
        })
        .collect())
}

/// Relationship ids of `<p:sldId>` entries, in list order
fn slide_relationship_ids(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();

    loop {
        match reader
            .read_event()
            .map_err(|e| DocumentFormat::Pptx.failure(e))?
        {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldId" => {
                // The prefixed `r:id` names the relationship; the bare `id` is numeric
                if let Some(id) = attribute(&e, |key| {
                    key.prefix().is_some() && key.local_name().as_ref() == b"id"
                })? {
                    ids.push(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(ids)
}

/// Map of relationship id to target from a `.rels` part
fn relationship_targets(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();

    loop {
        match reader
            .read_event()
            .map_err(|e| DocumentFormat::Pptx.failure(e))?
        {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = attribute(&e, |key| key.as_ref() == b"Id")?;
                let target = attribute(&e, |key| key.as_ref() == b"Target")?;
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(targets)
}

fn attribute<F>(element: &BytesStart<'_>, matches: F) -> Result<Option<String>>
where
    F: Fn(QName<'_>) -> bool,
{
    for attr in element.attributes() {
        let attr = attr.map_err(|e| DocumentFormat::Pptx.failure(e))?;
        if matches(attr.key) {
            let value = attr
                .unescape_value()
                .map_err(|e| DocumentFormat::Pptx.failure(e))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Package path of a relationship target taken relative to `ppt/`
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target.trim_start_matches("./")),
    }
}

/// Number of a slide part such as `ppt/slides/slide12.xml`
fn slide_number(part: &str) -> Option<u32> {
    part.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

/// Text of every top-level shape on a slide, in document order.
///
/// Each shape's paragraphs are joined with newlines. Shapes nested in groups,
/// pictures, connectors and graphic frames carry no text of their own.
pub(super) fn shape_texts(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut shapes = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut group_depth = 0usize;
    let mut in_shape = false;
    let mut in_paragraph = false;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DocumentFormat::Pptx.failure(e))?;

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"p:grpSp" => group_depth += 1,
                b"p:sp" if group_depth == 0 => {
                    in_shape = true;
                    paragraphs.clear();
                }
                b"a:p" if in_shape => {
                    in_paragraph = true;
                    paragraph.clear();
                }
                b"a:t" if in_paragraph => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"a:p" if in_shape => paragraphs.push(String::new()),
                b"a:br" if in_paragraph => paragraph.push('\n'),
                b"p:sp" if group_depth == 0 => shapes.push(String::new()),
                _ => {}
            },
            Event::Text(t) => {
                if in_text {
                    let content = t.unescape().map_err(|e| DocumentFormat::Pptx.failure(e))?;
                    paragraph.push_str(&content);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"p:grpSp" => group_depth = group_depth.saturating_sub(1),
                b"p:sp" if in_shape => {
                    shapes.push(paragraphs.join("\n"));
                    in_shape = false;
                }
                b"a:p" if in_paragraph => {
                    paragraphs.push(std::mem::take(&mut paragraph));
                    in_paragraph = false;
                }
                b"a:t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(shapes)
}

//! PPTX reader for inspecting generated decks.

use crate::parts::REL_SLIDE;
use deckgen_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Text read back from one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadSlide {
    /// 1-based slide number in presentation order.
    pub number: usize,

    /// Non-empty paragraphs in document order.
    pub paragraphs: Vec<String>,
}

/// Reader for PPTX (Office Open XML) files.
#[derive(Debug, Default)]
pub struct DeckReader;

impl DeckReader {
    /// Create a new PPTX reader.
    pub fn new() -> Self {
        Self
    }

    /// Read all slides of a PPTX package in presentation order.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<Vec<ReadSlide>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_paths = self.slide_order(&mut archive)?;
        let mut slides = Vec::with_capacity(slide_paths.len());
        for (idx, path) in slide_paths.iter().enumerate() {
            let xml = read_file_from_archive(&mut archive, path)?;
            slides.push(ReadSlide {
                number: idx + 1,
                paragraphs: paragraphs_from_xml(&xml)?,
            });
        }

        Ok(slides)
    }

    /// Slide part paths ordered by relationship id.
    fn slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels = read_file_from_archive(archive, "ppt/_rels/presentation.xml.rels")?;
        let mut slides: Vec<(String, Option<usize>)> = Vec::new();

        let mut reader = Reader::from_str(&rels);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut id = String::new();

                    for attr in e.attributes().flatten() {
                        let value = String::from_utf8_lossy(&attr.value).to_string();
                        match attr.key.as_ref() {
                            b"Type" => rel_type = value,
                            b"Target" => target = value,
                            b"Id" => id = value,
                            _ => {}
                        }
                    }

                    if rel_type == REL_SLIDE {
                        let order = trailing_number(&id).or_else(|| trailing_number(&target));
                        let path = match target.strip_prefix('/') {
                            Some(absolute) => absolute.to_string(),
                            None => format!("ppt/{}", target),
                        };
                        slides.push((path, order));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::PptxParseError(format!(
                        "Error parsing relationships: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }
}

/// Collect the text of every `a:p` paragraph in a slide.
fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"p" => {
                    in_paragraph = true;
                    current.clear();
                }
                b"t" => in_text = in_paragraph,
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::XmlError(format!("Bad text in slide: {}", e)))?;
                current.push_str(&text);
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text = false,
                b"p" if in_paragraph => {
                    in_paragraph = false;
                    let text = current.trim();
                    if !text.is_empty() {
                        paragraphs.push(text.to_string());
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::PptxParseError(format!("Error parsing slide: {}", e)));
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn read_file_from_archive<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Extract a trailing number from a string like "rId3" or "slide3.xml".
fn trailing_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml");
    let start = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    s[start..].parse().ok()
}

//! PPTX deck writer.
//!
//! Each slide holds a single text box on the blank layout. The archive is
//! written to a hidden `.part` file first and then linked under its final
//! name, so readers of the output directory never see a half-written deck and
//! an existing deck is never replaced.

use crate::parts::*;
use deckgen_core::{file_stem, Deck, Error, Result, Slide, SlideGroup, Topic};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Seek, Write};
use std::path::{Component, Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// File extension of generated decks.
pub const DECK_EXTENSION: &str = "pptx";

/// Length of the random hex suffix in deck file names.
const SUFFIX_LEN: usize = 5;

/// How many fresh names to try before giving up on a crowded directory.
const MAX_NAME_ATTEMPTS: usize = 8;

/// EMU in a tenth of an inch.
const EMU_PER_TENTH_INCH: i64 = 91_440;

/// Position and size of a text box, in EMU.
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
}

impl Frame {
    /// Build a frame from measurements in tenths of an inch.
    const fn tenths(x: i64, y: i64, cx: i64, cy: i64) -> Self {
        Self {
            x: x * EMU_PER_TENTH_INCH,
            y: y * EMU_PER_TENTH_INCH,
            cx: cx * EMU_PER_TENTH_INCH,
            cy: cy * EMU_PER_TENTH_INCH,
        }
    }
}

/// Run and paragraph formatting for one kind of slide.
#[derive(Debug, Clone, Copy)]
struct TextStyle {
    /// Font size in hundredths of a point.
    size: u32,
    bold: bool,
    color: &'static str,
    font: Option<&'static str>,
    centered: bool,
    bulleted: bool,
}

const HEADLINE_FRAME: Frame = Frame::tenths(10, 25, 80, 20);
const BODY_FRAME: Frame = Frame::tenths(10, 15, 80, 50);

const TITLE_STYLE: TextStyle = TextStyle {
    size: 4800,
    bold: true,
    color: "003366",
    font: None,
    centered: true,
    bulleted: false,
};

const BULLET_STYLE: TextStyle = TextStyle {
    size: 2400,
    bold: false,
    color: "000000",
    font: Some("Calibri"),
    centered: false,
    bulleted: true,
};

const CLOSING_STYLE: TextStyle = TextStyle {
    size: 4400,
    bold: true,
    color: "006600",
    font: None,
    centered: true,
    bulleted: false,
};

/// Slide size (10in x 7.5in, 4:3).
const SLIDE_CX: i64 = 9_144_000;
const SLIDE_CY: i64 = 6_858_000;

fn xml_err(e: quick_xml::Error) -> Error {
    Error::XmlError(e.to_string())
}

fn zip_err(e: zip::result::ZipError) -> Error {
    Error::ZipError(e.to_string())
}

/// Small wrapper over the quick-xml writer for building package parts.
struct XmlPart {
    writer: Writer<Vec<u8>>,
}

impl XmlPart {
    fn new() -> Result<Self> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_err)?;
        Ok(Self { writer })
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Start(elem)).map_err(xml_err)
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Empty(elem)).map_err(xml_err)
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_err)
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_err)
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start(name, &[])?;
        self.text(text)?;
        self.end(name)
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

/// Build `[Content_Types].xml` for a deck with `slide_count` slides.
fn content_types(slide_count: usize) -> String {
    let mut xml = String::from(CONTENT_TYPES_HEAD);
    for n in 1..=slide_count {
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="{}"/>"#,
            n, CT_SLIDE
        ));
    }
    xml.push_str("</Types>");
    xml
}

/// Relationship id of the n-th slide (1-based) in `presentation.xml.rels`.
///
/// rId1 and rId2 are taken by the master and theme.
fn slide_rel_id(n: usize) -> String {
    format!("rId{}", n + 2)
}

fn presentation_xml(slide_count: usize) -> Result<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.start(
        "p:presentation",
        &[
            ("xmlns:a", NS_A),
            ("xmlns:r", NS_R),
            ("xmlns:p", NS_P),
            ("saveSubsetFonts", "1"),
        ],
    )?;
    xml.start("p:sldMasterIdLst", &[])?;
    xml.empty("p:sldMasterId", &[("id", "2147483648"), ("r:id", "rId1")])?;
    xml.end("p:sldMasterIdLst")?;

    if slide_count > 0 {
        xml.start("p:sldIdLst", &[])?;
        for n in 1..=slide_count {
            // Slide ids start at 256
            let id = (255 + n).to_string();
            let rel = slide_rel_id(n);
            xml.empty("p:sldId", &[("id", id.as_str()), ("r:id", rel.as_str())])?;
        }
        xml.end("p:sldIdLst")?;
    }

    let cx = SLIDE_CX.to_string();
    let cy = SLIDE_CY.to_string();
    xml.empty(
        "p:sldSz",
        &[("cx", cx.as_str()), ("cy", cy.as_str()), ("type", "screen4x3")],
    )?;
    xml.empty("p:notesSz", &[("cx", cy.as_str()), ("cy", cx.as_str())])?;
    xml.end("p:presentation")?;
    Ok(xml.finish())
}

fn presentation_rels(slide_count: usize) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    xml.push_str(&format!(
        r#"<Relationship Id="rId1" Type="{}" Target="slideMasters/slideMaster1.xml"/>"#,
        REL_SLIDE_MASTER
    ));
    xml.push_str(&format!(
        r#"<Relationship Id="rId2" Type="{}" Target="theme/theme1.xml"/>"#,
        REL_THEME
    ));
    for n in 1..=slide_count {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="slides/slide{}.xml"/>"#,
            slide_rel_id(n),
            REL_SLIDE,
            n
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn core_xml(title: &str) -> Result<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.start(
        "cp:coreProperties",
        &[
            (
                "xmlns:cp",
                "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
            ),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;
    xml.text_element("dc:title", title)?;
    xml.text_element("dc:creator", "deckgen")?;
    xml.end("cp:coreProperties")?;
    Ok(xml.finish())
}

fn app_xml(slide_count: usize) -> Result<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.start(
        "Properties",
        &[(
            "xmlns",
            "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
        )],
    )?;
    xml.text_element("Application", "deckgen")?;
    xml.text_element("Slides", &slide_count.to_string())?;
    xml.end("Properties")?;
    Ok(xml.finish())
}

fn write_paragraph(xml: &mut XmlPart, text: &str, style: &TextStyle) -> Result<()> {
    xml.start("a:p", &[])?;

    if style.bulleted {
        xml.start("a:pPr", &[("marL", "342900"), ("indent", "-342900")])?;
        xml.empty("a:buFont", &[("typeface", "Arial")])?;
        xml.empty("a:buChar", &[("char", "\u{2022}")])?;
        xml.end("a:pPr")?;
    } else if style.centered {
        xml.empty("a:pPr", &[("algn", "ctr")])?;
    }

    let size = style.size.to_string();
    let mut run_attrs = vec![("lang", "en-US"), ("sz", size.as_str())];
    if style.bold {
        run_attrs.push(("b", "1"));
    }
    run_attrs.push(("dirty", "0"));

    xml.start("a:r", &[])?;
    xml.start("a:rPr", &run_attrs)?;
    xml.start("a:solidFill", &[])?;
    xml.empty("a:srgbClr", &[("val", style.color)])?;
    xml.end("a:solidFill")?;
    if let Some(font) = style.font {
        xml.empty("a:latin", &[("typeface", font)])?;
    }
    xml.end("a:rPr")?;
    xml.text_element("a:t", text)?;
    xml.end("a:r")?;

    xml.end("a:p")
}

fn write_text_box(xml: &mut XmlPart, frame: Frame, lines: &[&str], style: &TextStyle) -> Result<()> {
    xml.start("p:sp", &[])?;

    xml.start("p:nvSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", "2"), ("name", "TextBox 1")])?;
    xml.empty("p:cNvSpPr", &[("txBox", "1")])?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvSpPr")?;

    let (x, y, cx, cy) = (
        frame.x.to_string(),
        frame.y.to_string(),
        frame.cx.to_string(),
        frame.cy.to_string(),
    );
    xml.start("p:spPr", &[])?;
    xml.start("a:xfrm", &[])?;
    xml.empty("a:off", &[("x", x.as_str()), ("y", y.as_str())])?;
    xml.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    xml.end("a:xfrm")?;
    xml.start("a:prstGeom", &[("prst", "rect")])?;
    xml.empty("a:avLst", &[])?;
    xml.end("a:prstGeom")?;
    xml.empty("a:noFill", &[])?;
    xml.end("p:spPr")?;

    xml.start("p:txBody", &[])?;
    xml.empty("a:bodyPr", &[("wrap", "square"), ("rtlCol", "0")])?;
    xml.empty("a:lstStyle", &[])?;
    for line in lines {
        write_paragraph(xml, line, style)?;
    }
    xml.end("p:txBody")?;

    xml.end("p:sp")
}

/// Build the XML for one slide.
fn slide_xml(slide: &Slide) -> Result<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.start(
        "p:sld",
        &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)],
    )?;
    xml.start("p:cSld", &[])?;
    xml.start("p:spTree", &[])?;

    xml.start("p:nvGrpSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
    xml.empty("p:cNvGrpSpPr", &[])?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvGrpSpPr")?;
    xml.start("p:grpSpPr", &[])?;
    xml.start("a:xfrm", &[])?;
    xml.empty("a:off", &[("x", "0"), ("y", "0")])?;
    xml.empty("a:ext", &[("cx", "0"), ("cy", "0")])?;
    xml.empty("a:chOff", &[("x", "0"), ("y", "0")])?;
    xml.empty("a:chExt", &[("cx", "0"), ("cy", "0")])?;
    xml.end("a:xfrm")?;
    xml.end("p:grpSpPr")?;

    let lines = slide.lines();
    match slide {
        Slide::Title(_) => write_text_box(&mut xml, HEADLINE_FRAME, &lines, &TITLE_STYLE)?,
        Slide::Content(_) => write_text_box(&mut xml, BODY_FRAME, &lines, &BULLET_STYLE)?,
        Slide::Closing(_) => write_text_box(&mut xml, HEADLINE_FRAME, &lines, &CLOSING_STYLE)?,
    }

    xml.end("p:spTree")?;
    xml.end("p:cSld")?;
    xml.start("p:clrMapOvr", &[])?;
    xml.empty("a:masterClrMapping", &[])?;
    xml.end("p:clrMapOvr")?;
    xml.end("p:sld")?;
    Ok(xml.finish())
}

fn add_part<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    options: FileOptions,
    path: &str,
    content: &[u8],
) -> Result<()> {
    zip.start_file(path, options).map_err(zip_err)?;
    zip.write_all(content)?;
    Ok(())
}

/// Write a deck as a PPTX package into `writer`, returning the writer.
pub fn write_pptx<W: Write + Seek>(deck: &Deck, writer: W) -> Result<W> {
    let slide_count = deck.slide_count();
    let title = deck
        .slides
        .iter()
        .find_map(|s| match s {
            Slide::Title(t) => Some(t.as_str()),
            _ => None,
        })
        .unwrap_or_default();

    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    add_part(&mut zip, options, "[Content_Types].xml", content_types(slide_count).as_bytes())?;
    add_part(&mut zip, options, "_rels/.rels", ROOT_RELS.as_bytes())?;
    add_part(&mut zip, options, "docProps/core.xml", &core_xml(title)?)?;
    add_part(&mut zip, options, "docProps/app.xml", &app_xml(slide_count)?)?;
    add_part(&mut zip, options, "ppt/presentation.xml", &presentation_xml(slide_count)?)?;
    add_part(
        &mut zip,
        options,
        "ppt/_rels/presentation.xml.rels",
        presentation_rels(slide_count).as_bytes(),
    )?;
    add_part(&mut zip, options, "ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER.as_bytes())?;
    add_part(
        &mut zip,
        options,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        SLIDE_MASTER_RELS.as_bytes(),
    )?;
    add_part(&mut zip, options, "ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT.as_bytes())?;
    add_part(
        &mut zip,
        options,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        SLIDE_LAYOUT_RELS.as_bytes(),
    )?;
    add_part(&mut zip, options, "ppt/theme/theme1.xml", THEME.as_bytes())?;

    for (idx, slide) in deck.slides.iter().enumerate() {
        let n = idx + 1;
        add_part(&mut zip, options, &format!("ppt/slides/slide{}.xml", n), &slide_xml(slide)?)?;
        add_part(
            &mut zip,
            options,
            &format!("ppt/slides/_rels/slide{}.xml.rels", n),
            SLIDE_RELS.as_bytes(),
        )?;
    }

    zip.finish().map_err(zip_err)
}

/// Generate a fresh deck file name for a topic.
///
/// Format: `{stem}_{5 hex chars}.pptx`.
pub fn deck_file_name(topic: &Topic) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}.{}",
        file_stem(topic.as_str()),
        &hex[..SUFFIX_LEN],
        DECK_EXTENSION
    )
}

/// A deck written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDeck {
    /// File name inside the output directory.
    pub file_name: String,

    /// Total number of slides written.
    pub slide_count: usize,
}

/// Renders decks into a flat output directory.
#[derive(Debug, Clone)]
pub struct DeckRenderer {
    output_dir: PathBuf,
}

impl DeckRenderer {
    /// Create a renderer writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory decks are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Build a deck for `topic` from grouped bullets and write it.
    ///
    /// Any failure is reported as [`Error::RenderFailed`] and leaves no file behind.
    pub fn render(&self, topic: &Topic, groups: Vec<SlideGroup>) -> Result<RenderedDeck> {
        let deck = Deck::new(topic, groups);
        let file_name = self.write_deck(topic, &deck).map_err(|e| match e {
            Error::RenderFailed(_) => e,
            other => Error::RenderFailed(other.to_string()),
        })?;

        log::info!(
            "Wrote deck '{}' ({} slides) to {}",
            file_name,
            deck.slide_count(),
            self.output_dir.display()
        );

        Ok(RenderedDeck {
            file_name,
            slide_count: deck.slide_count(),
        })
    }

    /// Write an already-built deck under a fresh name, returning the file name.
    pub fn write_deck(&self, topic: &Topic, deck: &Deck) -> Result<String> {
        fs::create_dir_all(&self.output_dir)?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let file_name = deck_file_name(topic);
            let final_path = self.output_dir.join(&file_name);
            if final_path.exists() {
                continue;
            }

            let part_path = self.output_dir.join(format!(".{}.part", file_name));
            let file = match OpenOptions::new().write(true).create_new(true).open(&part_path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = write_file(deck, file) {
                let _ = fs::remove_file(&part_path);
                return Err(e);
            }
            if publish(&part_path, &final_path)? {
                return Ok(file_name);
            }
            log::debug!("Deck name '{}' was taken, retrying", file_name);
        }

        Err(Error::RenderFailed(format!(
            "no free file name for '{}' after {} attempts",
            topic, MAX_NAME_ATTEMPTS
        )))
    }

    /// Resolve a previously generated file name to its path.
    ///
    /// Only a single plain, non-hidden `.pptx` file name is accepted.
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf> {
        let path = Path::new(file_name);
        let mut components = path.components();
        let is_plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(name)), None) if name == path.as_os_str()
        );
        let has_extension = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case(DECK_EXTENSION))
            .unwrap_or(false);

        if !is_plain || file_name.starts_with('.') || !has_extension {
            return Err(Error::InvalidFileName(file_name.to_string()));
        }

        Ok(self.output_dir.join(path))
    }
}

/// Move a finished `.part` file to its final name without replacing anything.
///
/// Returns `false` when the final name is already taken. The `.part` file is
/// removed in every case.
fn publish(part_path: &Path, final_path: &Path) -> Result<bool> {
    let linked = fs::hard_link(part_path, final_path);
    let _ = fs::remove_file(part_path);
    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn write_file(deck: &Deck, file: File) -> Result<()> {
    let writer = write_pptx(deck, BufWriter::new(file))?;
    let file = writer
        .into_inner()
        .map_err(|e| Error::IoError(e.into_error()))?;
    file.sync_all()?;
    Ok(())
}

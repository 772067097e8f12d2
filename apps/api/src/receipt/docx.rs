//! `.docx` reader/writer for receipt templates.
//!
//! Only `word/document.xml` is parsed; every other archive entry is copied
//! through byte for byte. Inside the body, elements the model does not know
//! about are captured as raw XML and written back as-is.

use std::io::{Cursor, Read, Write};

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::receipt::document::{
    Block, Cell, Document, Group, Inline, Paragraph, Row, Run, RunContent, RunProperties, Table,
};

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const BODY_OPEN: &str = "<w:body>";
const BODY_CLOSE: &str = "</w:body>";

/// Inline elements whose runs are part of the paragraph's visible text.
/// `w:sdt` holds its runs one level down, in `w:sdtContent`.
const TEXT_WRAPPERS: &[&[u8]] = &[
    b"w:hyperlink",
    b"w:ins",
    b"w:smartTag",
    b"w:customXml",
    b"w:fldSimple",
    b"w:sdt",
    b"w:sdtContent",
    b"w:dir",
    b"w:bdo",
];

/// `w:rPr` children that come after `w:sz` in schema order.
const AFTER_SIZE: &[&[u8]] = &[
    b"w:szCs",
    b"w:highlight",
    b"w:u",
    b"w:effect",
    b"w:bdr",
    b"w:shd",
    b"w:fitText",
    b"w:vertAlign",
    b"w:rtl",
    b"w:cs",
    b"w:em",
    b"w:lang",
    b"w:eastAsianLayout",
    b"w:specVanish",
    b"w:oMath",
    b"w:rPrChange",
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Invalid template name: {0}")]
    InvalidName(String),

    #[error("Failed to read template: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a valid .docx archive: {0}")]
    Archive(#[from] ZipError),

    #[error("Template has no {DOCUMENT_PART} part")]
    MissingDocumentPart,

    #[error("Malformed document XML: {0}")]
    Xml(String),
}

fn xml_error(e: impl std::fmt::Display) -> TemplateError {
    TemplateError::Xml(e.to_string())
}

/// A loaded `.docx`: the original archive plus the parsed body.
#[derive(Debug, Clone)]
pub struct Docx {
    archive: Vec<u8>,
    /// `word/document.xml` up to and including `<w:body>`.
    prefix: String,
    /// `</w:body>` to the end of `word/document.xml`.
    suffix: String,
    pub document: Document,
}

impl Docx {
    pub fn from_bytes(archive: Vec<u8>) -> Result<Self, TemplateError> {
        let xml = {
            let mut zip = ZipArchive::new(Cursor::new(archive.as_slice()))?;
            let mut part = match zip.by_name(DOCUMENT_PART) {
                Ok(part) => part,
                Err(ZipError::FileNotFound) => return Err(TemplateError::MissingDocumentPart),
                Err(e) => return Err(e.into()),
            };
            let mut xml = String::new();
            part.read_to_string(&mut xml)?;
            xml
        };

        let open = xml
            .find(BODY_OPEN)
            .ok_or_else(|| xml_error("document has no <w:body>"))?;
        let body_start = open + BODY_OPEN.len();
        let close = xml
            .rfind(BODY_CLOSE)
            .filter(|close| *close >= body_start)
            .ok_or_else(|| xml_error("document has no </w:body>"))?;

        let document = Document {
            blocks: BodyParser::new(&xml[body_start..close]).parse_body()?,
        };

        Ok(Docx {
            prefix: xml[..body_start].to_string(),
            suffix: xml[close..].to_string(),
            archive,
            document,
        })
    }

    /// The full `word/document.xml` for the current document state.
    pub fn document_xml(&self) -> String {
        let mut xml = String::with_capacity(self.prefix.len() + self.suffix.len() + 4096);
        xml.push_str(&self.prefix);
        write_blocks(&mut xml, &self.document.blocks);
        xml.push_str(&self.suffix);
        xml
    }

    /// Re-packs the archive with the rewritten document part.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TemplateError> {
        let xml = self.document_xml();
        let mut source = ZipArchive::new(Cursor::new(self.archive.as_slice()))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for index in 0..source.len() {
            let entry = source.by_index(index)?;
            if entry.name() == DOCUMENT_PART {
                let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
                writer.start_file(DOCUMENT_PART, options)?;
                writer.write_all(xml.as_bytes())?;
            } else {
                writer.raw_copy_file(entry)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Reading
// ────────────────────────────────────────────────────────────────────────────

struct BodyParser<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> BodyParser<'a> {
    fn new(xml: &'a str) -> Self {
        Self {
            reader: Reader::from_str(xml),
        }
    }

    fn next(&mut self) -> Result<Event<'a>, TemplateError> {
        self.reader.read_event().map_err(xml_error)
    }

    /// Re-serializes `first` and, for a start tag, everything up to its end tag.
    fn capture(&mut self, first: Event<'a>) -> Result<String, TemplateError> {
        let mut writer = Writer::new(Vec::new());
        let mut depth = usize::from(matches!(first, Event::Start(_)));
        writer.write_event(first).map_err(xml_error)?;

        while depth > 0 {
            let event = self.next()?;
            match &event {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth -= 1,
                Event::Eof => return Err(xml_error("unexpected end of document")),
                _ => {}
            }
            writer.write_event(event).map_err(xml_error)?;
        }

        String::from_utf8(writer.into_inner()).map_err(xml_error)
    }

    /// Skips the rest of an element whose start tag was just read.
    fn skip(&mut self, event: Event<'a>) -> Result<(), TemplateError> {
        self.capture(event).map(|_| ())
    }

    fn parse_body(mut self) -> Result<Vec<Block>, TemplateError> {
        let mut blocks = Vec::new();
        loop {
            match self.next()? {
                Event::Eof => return Ok(blocks),
                Event::End(e) => {
                    return Err(xml_error(format!(
                        "unbalanced </{}> in body",
                        String::from_utf8_lossy(e.name().as_ref())
                    )))
                }
                event => {
                    if let Some(block) = self.block(event)? {
                        blocks.push(block);
                    }
                }
            }
        }
    }

    /// Turns a body- or cell-level event into a block. Whitespace and
    /// comments between elements are dropped.
    fn block(&mut self, event: Event<'a>) -> Result<Option<Block>, TemplateError> {
        let block = match event {
            Event::Start(e) if e.name().as_ref() == b"w:p" => {
                Block::Paragraph(self.parse_paragraph()?)
            }
            Event::Empty(e) if e.name().as_ref() == b"w:p" => Block::Paragraph(Paragraph::default()),
            Event::Start(e) if e.name().as_ref() == b"w:tbl" => Block::Table(self.parse_table()?),
            event @ (Event::Start(_) | Event::Empty(_)) => Block::Raw(self.capture(event)?),
            _ => return Ok(None),
        };
        Ok(Some(block))
    }

    fn parse_paragraph(&mut self) -> Result<Paragraph, TemplateError> {
        let mut paragraph = Paragraph::default();
        loop {
            match self.next()? {
                Event::End(e) if e.name().as_ref() == b"w:p" => return Ok(paragraph),
                Event::Eof => return Err(xml_error("unterminated <w:p>")),
                event if element_name(&event) == Some(b"w:pPr".as_slice()) => {
                    paragraph.properties = Some(self.capture(event)?);
                }
                event => {
                    if let Some(inline) = self.inline(event)? {
                        paragraph.content.push(inline);
                    }
                }
            }
        }
    }

    /// Turns a paragraph-level event into an inline item.
    fn inline(&mut self, event: Event<'a>) -> Result<Option<Inline>, TemplateError> {
        let inline = match event {
            Event::Start(e) if e.name().as_ref() == b"w:r" => Inline::Run(self.parse_run()?),
            Event::Empty(e) if e.name().as_ref() == b"w:r" => Inline::Run(Run::default()),
            Event::Start(e) if TEXT_WRAPPERS.contains(&e.name().as_ref()) => {
                Inline::Group(self.parse_group(e)?)
            }
            event @ (Event::Start(_) | Event::Empty(_)) => Inline::Raw(self.capture(event)?),
            _ => return Ok(None),
        };
        Ok(Some(inline))
    }

    fn parse_group(&mut self, start: BytesStart<'a>) -> Result<Group, TemplateError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Start(start)).map_err(xml_error)?;
        let mut group = Group {
            start: String::from_utf8(writer.into_inner()).map_err(xml_error)?,
            content: Vec::new(),
            end: format!("</{name}>"),
        };
        loop {
            match self.next()? {
                Event::End(e) if e.name().as_ref() == name.as_bytes() => return Ok(group),
                Event::End(e) => {
                    return Err(xml_error(format!(
                        "unbalanced </{}> in <{name}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    )))
                }
                Event::Eof => return Err(xml_error(format!("unterminated <{name}>"))),
                event => {
                    if let Some(inline) = self.inline(event)? {
                        group.content.push(inline);
                    }
                }
            }
        }
    }

    fn parse_run(&mut self) -> Result<Run, TemplateError> {
        let mut run = Run::default();
        loop {
            let event = self.next()?;
            let (name, is_start, line_break) = match &event {
                Event::End(e) if e.name().as_ref() == b"w:r" => return Ok(run),
                Event::Eof => return Err(xml_error("unterminated <w:r>")),
                Event::Start(e) | Event::Empty(e) => {
                    let name = e.name().as_ref().to_vec();
                    let line_break = matches!(name.as_slice(), b"w:br" | b"w:cr") && is_line_break(e)?;
                    (name, matches!(event, Event::Start(_)), line_break)
                }
                _ => continue,
            };

            match name.as_slice() {
                b"w:rPr" => {
                    if is_start {
                        run.properties = self.parse_run_properties()?;
                    }
                }
                b"w:t" => {
                    if is_start {
                        run.content.push(RunContent::Text(self.read_text()?));
                    }
                }
                b"w:tab" => {
                    run.content.push(RunContent::Tab);
                    if is_start {
                        self.skip(event)?;
                    }
                }
                _ if line_break => {
                    run.content.push(RunContent::Break);
                    if is_start {
                        self.skip(event)?;
                    }
                }
                _ => run.content.push(RunContent::Raw(self.capture(event)?)),
            }
        }
    }

    fn read_text(&mut self) -> Result<String, TemplateError> {
        let mut text = String::new();
        loop {
            match self.next()? {
                Event::Text(t) => text.push_str(&t.unescape().map_err(xml_error)?),
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c.into_inner())),
                Event::End(e) if e.name().as_ref() == b"w:t" => return Ok(text),
                Event::Eof => return Err(xml_error("unterminated <w:t>")),
                _ => {}
            }
        }
    }

    fn parse_run_properties(&mut self) -> Result<RunProperties, TemplateError> {
        let mut properties = RunProperties::default();
        loop {
            let event = self.next()?;
            let name = match &event {
                Event::End(e) if e.name().as_ref() == b"w:rPr" => return Ok(properties),
                Event::Eof => return Err(xml_error("unterminated <w:rPr>")),
                Event::Start(e) | Event::Empty(e) => e.name().as_ref().to_vec(),
                _ => continue,
            };

            match name.as_slice() {
                b"w:rFonts" => {
                    if let Event::Start(e) | Event::Empty(e) = &event {
                        read_fonts(e, &mut properties)?;
                    }
                    if matches!(event, Event::Start(_)) {
                        self.skip(event)?;
                    }
                }
                b"w:sz" => {
                    if let Event::Start(e) | Event::Empty(e) = &event {
                        properties.size_half_points = attribute(e, "w:val")?
                            .and_then(|v| v.parse::<u32>().ok());
                    }
                    if matches!(event, Event::Start(_)) {
                        self.skip(event)?;
                    }
                }
                b"w:rStyle" => properties.style = Some(self.capture(event)?),
                other => {
                    let after = AFTER_SIZE.contains(&other);
                    let raw = self.capture(event)?;
                    if after {
                        properties.after_size.push_str(&raw);
                    } else {
                        properties.before_size.push_str(&raw);
                    }
                }
            }
        }
    }

    fn parse_table(&mut self) -> Result<Table, TemplateError> {
        let mut table = Table::default();
        loop {
            match self.next()? {
                Event::End(e) if e.name().as_ref() == b"w:tbl" => return Ok(table),
                Event::Start(e) if e.name().as_ref() == b"w:tr" => table.rows.push(self.parse_row()?),
                event @ (Event::Start(_) | Event::Empty(_)) => {
                    table.properties.push_str(&self.capture(event)?)
                }
                Event::Eof => return Err(xml_error("unterminated <w:tbl>")),
                _ => {}
            }
        }
    }

    fn parse_row(&mut self) -> Result<Row, TemplateError> {
        let mut row = Row::default();
        loop {
            match self.next()? {
                Event::End(e) if e.name().as_ref() == b"w:tr" => return Ok(row),
                Event::Start(e) if e.name().as_ref() == b"w:tc" => row.cells.push(self.parse_cell()?),
                Event::Empty(e) if e.name().as_ref() == b"w:tc" => row.cells.push(Cell::default()),
                event @ (Event::Start(_) | Event::Empty(_)) => {
                    row.properties.push_str(&self.capture(event)?)
                }
                Event::Eof => return Err(xml_error("unterminated <w:tr>")),
                _ => {}
            }
        }
    }

    fn parse_cell(&mut self) -> Result<Cell, TemplateError> {
        let mut cell = Cell::default();
        loop {
            match self.next()? {
                Event::End(e) if e.name().as_ref() == b"w:tc" => return Ok(cell),
                Event::Eof => return Err(xml_error("unterminated <w:tc>")),
                event if element_name(&event) == Some(b"w:tcPr".as_slice()) => {
                    cell.properties = Some(self.capture(event)?);
                }
                event => {
                    if let Some(block) = self.block(event)? {
                        cell.blocks.push(block);
                    }
                }
            }
        }
    }
}

fn element_name<'e>(event: &'e Event<'_>) -> Option<&'e [u8]> {
    match event {
        Event::Start(e) | Event::Empty(e) => Some(e.name().into_inner()),
        _ => None,
    }
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, TemplateError> {
    match e.try_get_attribute(name).map_err(xml_error)? {
        Some(attr) => Ok(Some(attr.unescape_value().map_err(xml_error)?.into_owned())),
        None => Ok(None),
    }
}

/// Plain line breaks only; page and column breaks stay raw.
fn is_line_break(e: &BytesStart<'_>) -> Result<bool, TemplateError> {
    Ok(matches!(
        attribute(e, "w:type")?.as_deref(),
        None | Some("textWrapping")
    ))
}

fn read_fonts(e: &BytesStart<'_>, properties: &mut RunProperties) -> Result<(), TemplateError> {
    let mut ascii = None;
    let mut h_ansi = None;
    for attr in e.attributes() {
        let attr = attr.map_err(xml_error)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_error)?.into_owned();
        match key.as_str() {
            "w:ascii" => ascii = Some(value),
            "w:hAnsi" => h_ansi = Some(value),
            _ => properties.font_attributes.push((key, value)),
        }
    }
    properties.font_family = ascii.or(h_ansi);
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Writing
// ────────────────────────────────────────────────────────────────────────────

fn write_blocks(out: &mut String, blocks: &[Block]) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => write_paragraph(out, p),
            Block::Table(t) => write_table(out, t),
            Block::Raw(raw) => out.push_str(raw),
        }
    }
}

fn write_paragraph(out: &mut String, paragraph: &Paragraph) {
    out.push_str("<w:p>");
    if let Some(properties) = &paragraph.properties {
        out.push_str(properties);
    }
    write_inlines(out, &paragraph.content);
    out.push_str("</w:p>");
}

fn write_inlines(out: &mut String, content: &[Inline]) {
    for inline in content {
        match inline {
            Inline::Run(run) => write_run(out, run),
            Inline::Group(group) => {
                out.push_str(&group.start);
                write_inlines(out, &group.content);
                out.push_str(&group.end);
            }
            Inline::Raw(raw) => out.push_str(raw),
        }
    }
}

fn write_run(out: &mut String, run: &Run) {
    out.push_str("<w:r>");
    write_run_properties(out, &run.properties);
    for item in &run.content {
        match item {
            RunContent::Text(text) => {
                out.push_str("<w:t xml:space=\"preserve\">");
                out.push_str(&escape(text.as_str()));
                out.push_str("</w:t>");
            }
            RunContent::Tab => out.push_str("<w:tab/>"),
            RunContent::Break => out.push_str("<w:br/>"),
            RunContent::Raw(raw) => out.push_str(raw),
        }
    }
    out.push_str("</w:r>");
}

fn write_run_properties(out: &mut String, properties: &RunProperties) {
    if properties.is_empty() {
        return;
    }
    out.push_str("<w:rPr>");
    if let Some(style) = &properties.style {
        out.push_str(style);
    }
    if properties.font_family.is_some() || !properties.font_attributes.is_empty() {
        out.push_str("<w:rFonts");
        if let Some(family) = &properties.font_family {
            let family = escape(family.as_str());
            out.push_str(&format!(" w:ascii=\"{family}\" w:hAnsi=\"{family}\""));
        }
        for (key, value) in &properties.font_attributes {
            out.push_str(&format!(" {key}=\"{}\"", escape(value.as_str())));
        }
        out.push_str("/>");
    }
    out.push_str(&properties.before_size);
    if let Some(size) = properties.size_half_points {
        out.push_str(&format!("<w:sz w:val=\"{size}\"/>"));
    }
    out.push_str(&properties.after_size);
    out.push_str("</w:rPr>");
}

fn write_table(out: &mut String, table: &Table) {
    out.push_str("<w:tbl>");
    out.push_str(&table.properties);
    for row in &table.rows {
        out.push_str("<w:tr>");
        out.push_str(&row.properties);
        for cell in &row.cells {
            out.push_str("<w:tc>");
            if let Some(properties) = &cell.properties {
                out.push_str(properties);
            }
            write_blocks(out, &cell.blocks);
            // A cell must end with a paragraph.
            if !matches!(cell.blocks.last(), Some(Block::Paragraph(_))) {
                out.push_str("<w:p/>");
            }
            out.push_str("</w:tc>");
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

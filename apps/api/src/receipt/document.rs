//! In-memory model of a Word document body.
//!
//! Only the parts receipt generation reads or rewrites are modelled: body
//! paragraphs, tables, cells, runs, run text and the run font. Everything
//! else (paragraph/table/cell properties, bookmarks, drawings, section
//! properties, unknown elements) is carried as raw XML so the codec can write
//! it back untouched.

/// A whole `w:body`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    /// Any other body-level element, e.g. `w:sectPr` or `w:sdt`.
    Raw(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    /// Raw `w:pPr` element.
    pub properties: Option<String>,
    pub content: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Run(Run),
    /// A wrapper whose runs are visible paragraph text.
    Group(Group),
    /// Bookmarks, proofing marks, deletions and the like.
    Raw(String),
}

/// `w:hyperlink`, `w:ins`, `w:smartTag`, `w:sdt` and similar inline wrappers.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Serialized start tag, attributes included.
    pub start: String,
    pub content: Vec<Inline>,
    /// Serialized end tag.
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    pub properties: RunProperties,
    pub content: Vec<RunContent>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunContent {
    Text(String),
    Tab,
    Break,
    Raw(String),
}

/// Run properties with the font family and size pulled out.
///
/// `w:rPr` children are order-sensitive, so the remaining raw children are
/// kept in two buckets: those that precede `w:sz` and those that follow it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunProperties {
    /// Raw `w:rStyle` element.
    pub style: Option<String>,
    /// `w:rFonts/@w:ascii` (mirrored to `w:hAnsi` on write).
    pub font_family: Option<String>,
    /// Other `w:rFonts` attributes, e.g. `w:eastAsia`, kept as written.
    pub font_attributes: Vec<(String, String)>,
    /// `w:sz/@w:val`, in half-points.
    pub size_half_points: Option<u32>,
    pub before_size: String,
    pub after_size: String,
}

impl RunProperties {
    pub fn is_empty(&self) -> bool {
        self.style.is_none()
            && self.font_family.is_none()
            && self.font_attributes.is_empty()
            && self.size_half_points.is_none()
            && self.before_size.is_empty()
            && self.after_size.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Raw `w:tblPr` and `w:tblGrid`, in document order.
    pub properties: String,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Raw `w:trPr` plus anything else in the row that is not a cell.
    pub properties: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    /// Raw `w:tcPr`.
    pub properties: Option<String>,
    pub blocks: Vec<Block>,
}

// ────────────────────────────────────────────────────────────────────────────
// Text access
// ────────────────────────────────────────────────────────────────────────────

impl Run {
    /// Builds a run from plain text; `\t` and `\n` become tab and break marks.
    pub fn from_text(text: &str, properties: RunProperties) -> Self {
        let mut content = Vec::new();
        let mut buffer = String::new();
        for c in text.chars() {
            let mark = match c {
                '\t' => RunContent::Tab,
                '\n' => RunContent::Break,
                _ => {
                    buffer.push(c);
                    continue;
                }
            };
            if !buffer.is_empty() {
                content.push(RunContent::Text(std::mem::take(&mut buffer)));
            }
            content.push(mark);
        }
        if !buffer.is_empty() {
            content.push(RunContent::Text(buffer));
        }
        Run {
            properties,
            content,
        }
    }

    pub fn text(&self) -> String {
        let mut text = String::new();
        for item in &self.content {
            match item {
                RunContent::Text(t) => text.push_str(t),
                RunContent::Tab => text.push('\t'),
                RunContent::Break => text.push('\n'),
                RunContent::Raw(_) => {}
            }
        }
        text
    }

    pub fn set_font(&mut self, family: &str, size_half_points: u32) {
        self.properties.font_family = Some(family.to_string());
        self.properties.size_half_points = Some(size_half_points);
    }
}

impl Paragraph {
    #[cfg(test)]
    pub fn from_text(text: &str) -> Self {
        let mut paragraph = Paragraph::default();
        paragraph.set_text(text);
        paragraph
    }

    /// Every run in document order, including those inside wrappers.
    pub fn runs(&self) -> Vec<&Run> {
        let mut runs = Vec::new();
        inline_runs(&self.content, &mut runs);
        runs
    }

    pub fn runs_mut(&mut self) -> Vec<&mut Run> {
        let mut runs = Vec::new();
        inline_runs_mut(&mut self.content, &mut runs);
        runs
    }

    /// Concatenated text of every run, hyperlinks and insertions included.
    pub fn text(&self) -> String {
        self.runs().into_iter().map(Run::text).collect()
    }

    /// Replaces all content with a single run holding `text`.
    /// Wrappers are flattened, so hyperlink text survives as plain text.
    /// Paragraph properties and the first run's formatting are kept.
    pub fn set_text(&mut self, text: &str) {
        let properties = self
            .runs()
            .first()
            .map(|run| run.properties.clone())
            .unwrap_or_default();
        self.content = vec![Inline::Run(Run::from_text(text, properties))];
    }
}

fn inline_runs<'a>(content: &'a [Inline], runs: &mut Vec<&'a Run>) {
    for inline in content {
        match inline {
            Inline::Run(run) => runs.push(run),
            Inline::Group(group) => inline_runs(&group.content, runs),
            Inline::Raw(_) => {}
        }
    }
}

fn inline_runs_mut<'a>(content: &'a mut [Inline], runs: &mut Vec<&'a mut Run>) {
    for inline in content {
        match inline {
            Inline::Run(run) => runs.push(run),
            Inline::Group(group) => inline_runs_mut(&mut group.content, runs),
            Inline::Raw(_) => {}
        }
    }
}

impl Cell {
    #[cfg(test)]
    pub fn from_text(text: &str) -> Self {
        Cell {
            properties: None,
            blocks: vec![Block::Paragraph(Paragraph::from_text(text))],
        }
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.blocks.iter_mut().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Text of the cell's direct paragraphs, one line per paragraph.
    pub fn text(&self) -> String {
        self.paragraphs()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replaces the cell content with one paragraph holding `text`.
    pub fn set_text(&mut self, text: &str) {
        let mut paragraph = self.paragraphs().next().cloned().unwrap_or_default();
        paragraph.set_text(text);
        self.blocks = vec![Block::Paragraph(paragraph)];
    }
}

impl Table {
    #[cfg(test)]
    pub fn from_rows(rows: &[&[&str]]) -> Self {
        Table {
            properties: String::new(),
            rows: rows
                .iter()
                .map(|cells| Row {
                    properties: String::new(),
                    cells: cells.iter().map(|text| Cell::from_text(text)).collect(),
                })
                .collect(),
        }
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.rows.iter_mut().flat_map(|row| row.cells.iter_mut())
    }
}

impl Document {
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.blocks.iter_mut().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.blocks.iter_mut().filter_map(|block| match block {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Every run in the document, including nested tables.
    #[cfg(test)]
    pub fn all_runs(&self) -> Vec<&Run> {
        let mut runs = Vec::new();
        collect_runs(&self.blocks, &mut runs);
        runs
    }

    /// All visible text, one line per paragraph, tables flattened row by row.
    #[cfg(test)]
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::new();
        collect_lines(&self.blocks, &mut lines);
        lines.join("\n")
    }
}

#[cfg(test)]
fn collect_runs<'a>(blocks: &'a [Block], runs: &mut Vec<&'a Run>) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => runs.extend(p.runs()),
            Block::Table(t) => {
                for cell in t.rows.iter().flat_map(|r| r.cells.iter()) {
                    collect_runs(&cell.blocks, runs);
                }
            }
            Block::Raw(_) => {}
        }
    }
}

#[cfg(test)]
fn collect_lines(blocks: &[Block], lines: &mut Vec<String>) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => lines.push(p.text()),
            Block::Table(t) => {
                for cell in t.rows.iter().flat_map(|r| r.cells.iter()) {
                    collect_lines(&cell.blocks, lines);
                }
            }
            Block::Raw(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_from_text_splits_tabs_and_breaks() {
        let run = Run::from_text("a\tb\nc", RunProperties::default());
        assert_eq!(
            run.content,
            vec![
                RunContent::Text("a".into()),
                RunContent::Tab,
                RunContent::Text("b".into()),
                RunContent::Break,
                RunContent::Text("c".into()),
            ]
        );
        assert_eq!(run.text(), "a\tb\nc");
    }

    #[test]
    fn test_paragraph_text_spans_runs() {
        let paragraph = Paragraph {
            properties: None,
            content: vec![
                Inline::Run(Run::from_text("$amo", RunProperties::default())),
                Inline::Raw("<w:bookmarkStart w:id=\"0\" w:name=\"x\"/>".into()),
                Inline::Run(Run::from_text("unt$", RunProperties::default())),
            ],
        };
        assert_eq!(paragraph.text(), "$amount$");
    }

    fn hyperlink(text: &str) -> Inline {
        Inline::Group(Group {
            start: r#"<w:hyperlink r:id="rId5">"#.into(),
            content: vec![Inline::Run(Run::from_text(text, RunProperties::default()))],
            end: "</w:hyperlink>".into(),
        })
    }

    #[test]
    fn test_paragraph_text_includes_hyperlink_runs() {
        let paragraph = Paragraph {
            properties: None,
            content: vec![
                Inline::Run(Run::from_text("visit ", RunProperties::default())),
                hyperlink("atmcleaning.com.au"),
                Inline::Run(Run::from_text(" today", RunProperties::default())),
            ],
        };
        assert_eq!(paragraph.text(), "visit atmcleaning.com.au today");
        assert_eq!(paragraph.runs().len(), 3);
    }

    #[test]
    fn test_set_text_flattens_wrappers() {
        let mut paragraph = Paragraph {
            properties: None,
            content: vec![hyperlink("atmcleaning.com.au")],
        };
        paragraph.set_text("see atmcleaning.com.au");
        assert!(matches!(paragraph.content.as_slice(), [Inline::Run(_)]));
        assert_eq!(paragraph.text(), "see atmcleaning.com.au");
    }

    #[test]
    fn test_set_text_keeps_paragraph_properties_and_first_run_format() {
        let bold = RunProperties {
            before_size: "<w:b/>".into(),
            ..Default::default()
        };
        let mut paragraph = Paragraph {
            properties: Some("<w:pPr><w:jc w:val=\"right\"/></w:pPr>".into()),
            content: vec![
                Inline::Run(Run::from_text("one", bold.clone())),
                Inline::Run(Run::from_text("two", RunProperties::default())),
            ],
        };
        paragraph.set_text("three");
        assert_eq!(paragraph.text(), "three");
        assert_eq!(paragraph.runs().len(), 1);
        assert_eq!(paragraph.runs()[0].properties, bold);
        assert!(paragraph.properties.is_some());
    }

    #[test]
    fn test_cell_text_joins_paragraphs() {
        let mut cell = Cell {
            properties: None,
            blocks: vec![
                Block::Paragraph(Paragraph::from_text("first")),
                Block::Paragraph(Paragraph::from_text("second")),
            ],
        };
        assert_eq!(cell.text(), "first\nsecond");

        cell.set_text("only");
        assert_eq!(cell.paragraphs().count(), 1);
        assert_eq!(cell.text(), "only");
    }

    #[test]
    fn test_plain_text_walks_tables() {
        let document = Document {
            blocks: vec![
                Block::Paragraph(Paragraph::from_text("Receipt")),
                Block::Table(Table::from_rows(&[&["a", "b"], &["c", "d"]])),
            ],
        };
        assert_eq!(document.plain_text(), "Receipt\na\nb\nc\nd");
        assert_eq!(document.all_runs().len(), 5);
    }
}

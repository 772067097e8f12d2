//! Placeholder substitution over a receipt template.
//!
//! Tokens are fixed `$name$` literals. Each paragraph and each table cell is
//! scanned once, left to right; a substituted value is never rescanned, so a
//! value that happens to contain a token cannot trigger a second replacement.
//! After substitution every run is forced to the receipt font, whether or not
//! its text changed.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::receipt::document::{Document, Paragraph};

/// The receipt template vocabulary. No token is a prefix of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Token {
    Date,
    Address,
    Amount,
    BasicService,
    ElectricalAppliances,
    Rooms,
    OtherServices,
    Awa,
    AwaServices,
    ExcludedElectrical,
}

impl Token {
    #[cfg(test)]
    pub const ALL: [Token; 10] = [
        Token::Date,
        Token::Address,
        Token::Amount,
        Token::BasicService,
        Token::ElectricalAppliances,
        Token::Rooms,
        Token::OtherServices,
        Token::Awa,
        Token::AwaServices,
        Token::ExcludedElectrical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Token::Date => "$date$",
            Token::Address => "$address$",
            Token::Amount => "$amount$",
            Token::BasicService => "$basic_service$",
            Token::ElectricalAppliances => "$electrical_appliances$",
            Token::Rooms => "$rooms$",
            Token::OtherServices => "$other_services$",
            Token::Awa => "$awa$",
            Token::AwaServices => "$awa_services$",
            Token::ExcludedElectrical => "$excluded_ele$",
        }
    }
}

/// Rendered value for each token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceholderMap {
    values: BTreeMap<Token, String>,
}

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: Token, value: impl Into<String>) {
        self.values.insert(token, value.into());
    }

    pub fn with(mut self, token: Token, value: impl Into<String>) -> Self {
        self.insert(token, value);
        self
    }

    #[cfg(test)]
    pub fn get(&self, token: Token) -> Option<&str> {
        self.values.get(&token).map(String::as_str)
    }

    pub fn tokens(&self) -> impl Iterator<Item = Token> + '_ {
        self.values.keys().copied()
    }

    /// The token (and its value) that `text` starts with, if any.
    fn match_prefix(&self, text: &str) -> Option<(Token, &str)> {
        self.values
            .iter()
            .find(|(token, _)| text.starts_with(token.as_str()))
            .map(|(token, value)| (*token, value.as_str()))
    }
}

/// Font forced onto every run after substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStyle {
    pub font_family: String,
    pub font_size_pt: u8,
}

impl Default for RunStyle {
    fn default() -> Self {
        RunStyle {
            font_family: "Arial".to_string(),
            font_size_pt: 10,
        }
    }
}

impl RunStyle {
    fn half_points(&self) -> u32 {
        u32::from(self.font_size_pt) * 2
    }
}

/// What a substitution pass did, for logging.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubstitutionReport {
    /// Paragraphs and cells whose text changed.
    pub rewritten_blocks: usize,
    pub unused_tokens: Vec<Token>,
}

/// Replaces every token occurrence in body paragraphs and table cells, then
/// restyles all runs of those paragraphs and cells.
pub fn substitute(
    document: &mut Document,
    map: &PlaceholderMap,
    style: &RunStyle,
) -> SubstitutionReport {
    let mut used = BTreeSet::new();
    let mut rewritten_blocks = 0;

    for paragraph in document.paragraphs_mut() {
        if let Some(text) = replace_tokens(&paragraph.text(), map, &mut used) {
            paragraph.set_text(&text);
            rewritten_blocks += 1;
        }
        apply_style(paragraph, style);
    }

    for table in document.tables_mut() {
        for cell in table.cells_mut() {
            if let Some(text) = replace_tokens(&cell.text(), map, &mut used) {
                cell.set_text(&text);
                rewritten_blocks += 1;
            }
            for paragraph in cell.paragraphs_mut() {
                apply_style(paragraph, style);
            }
        }
    }

    let unused_tokens: Vec<Token> = map.tokens().filter(|t| !used.contains(t)).collect();
    if !unused_tokens.is_empty() {
        debug!("Template did not use tokens: {unused_tokens:?}");
    }

    SubstitutionReport {
        rewritten_blocks,
        unused_tokens,
    }
}

/// Single-pass replacement. Returns `None` when nothing matched.
fn replace_tokens(text: &str, map: &PlaceholderMap, used: &mut BTreeSet<Token>) -> Option<String> {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    let mut replaced = false;

    while let Some(pos) = rest.find('$') {
        output.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match map.match_prefix(tail) {
            Some((token, value)) => {
                output.push_str(value);
                rest = &tail[token.as_str().len()..];
                used.insert(token);
                replaced = true;
            }
            None => {
                output.push('$');
                rest = &tail[1..];
            }
        }
    }
    output.push_str(rest);

    replaced.then_some(output)
}

fn apply_style(paragraph: &mut Paragraph, style: &RunStyle) {
    let half_points = style.half_points();
    for run in paragraph.runs_mut() {
        run.set_font(&style.font_family, half_points);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::document::{Block, Cell, Inline, Run, RunProperties, Table};

    fn styled(document: &Document, style: &RunStyle) -> bool {
        document.all_runs().iter().all(|run| {
            run.properties.font_family.as_deref() == Some(style.font_family.as_str())
                && run.properties.size_half_points == Some(style.half_points())
        })
    }

    #[test]
    fn test_token_strings_are_prefix_free() {
        for a in Token::ALL {
            for b in Token::ALL {
                if a != b {
                    assert!(!b.as_str().starts_with(a.as_str()), "{a:?} prefixes {b:?}");
                }
            }
        }
    }

    #[test]
    fn test_amount_in_single_cell() {
        let mut document = Document {
            blocks: vec![Block::Table(Table::from_rows(&[&["$amount$"]]))],
        };
        let map = PlaceholderMap::new().with(Token::Amount, "150.00");

        let report = substitute(&mut document, &map, &RunStyle::default());

        assert_eq!(document.plain_text(), "150.00");
        assert!(!document.plain_text().contains("$amount$"));
        assert_eq!(report.rewritten_blocks, 1);
        assert!(report.unused_tokens.is_empty());
    }

    #[test]
    fn test_no_matching_tokens_only_restyles() {
        let mut document = Document {
            blocks: vec![
                Block::Paragraph(Paragraph::from_text("Thank you for your business")),
                Block::Table(Table::from_rows(&[&["Total", "$ 20"]])),
            ],
        };
        let before = document.plain_text();
        let style = RunStyle::default();

        let report = substitute(
            &mut document,
            &PlaceholderMap::new().with(Token::Date, "1st Mar. 2024"),
            &style,
        );

        assert_eq!(document.plain_text(), before);
        assert!(styled(&document, &style));
        assert_eq!(report.rewritten_blocks, 0);
        assert_eq!(report.unused_tokens, vec![Token::Date]);
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let mut document = Document {
            blocks: vec![Block::Paragraph(Paragraph::from_text(
                "$address$ / $address$ on $date$",
            ))],
        };
        let map = PlaceholderMap::new()
            .with(Token::Address, "12 King St")
            .with(Token::Date, "11th Dec. 2024");

        substitute(&mut document, &map, &RunStyle::default());

        assert_eq!(
            document.plain_text(),
            "12 King St / 12 King St on 11th Dec. 2024"
        );
    }

    #[test]
    fn test_token_split_across_runs() {
        let mut document = Document {
            blocks: vec![Block::Paragraph(Paragraph {
                properties: None,
                content: vec![
                    Inline::Run(Run::from_text("Total: $amo", RunProperties::default())),
                    Inline::Run(Run::from_text("unt$", RunProperties::default())),
                ],
            })],
        };

        substitute(
            &mut document,
            &PlaceholderMap::new().with(Token::Amount, "99.50"),
            &RunStyle::default(),
        );

        assert_eq!(document.plain_text(), "Total: 99.50");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let mut document = Document {
            blocks: vec![Block::Paragraph(Paragraph::from_text("$rooms$ and $awa$"))],
        };
        let map = PlaceholderMap::new()
            .with(Token::Rooms, "$awa$")
            .with(Token::Awa, "as well as");

        substitute(&mut document, &map, &RunStyle::default());

        assert_eq!(document.plain_text(), "$awa$ and as well as");
    }

    #[test]
    fn test_awa_does_not_swallow_awa_services() {
        let mut document = Document {
            blocks: vec![Block::Paragraph(Paragraph::from_text("$awa$ $awa_services$"))],
        };
        let map = PlaceholderMap::new()
            .with(Token::Awa, "as well as")
            .with(Token::AwaServices, "mold removal");

        substitute(&mut document, &map, &RunStyle::default());

        assert_eq!(document.plain_text(), "as well as mold removal");
    }

    #[test]
    fn test_lone_dollar_signs_survive() {
        let mut document = Document {
            blocks: vec![Block::Paragraph(Paragraph::from_text("$$amount$ $"))],
        };
        substitute(
            &mut document,
            &PlaceholderMap::new().with(Token::Amount, "10.00"),
            &RunStyle::default(),
        );
        assert_eq!(document.plain_text(), "$10.00 $");
    }

    #[test]
    fn test_multi_paragraph_cell_collapses_to_one_paragraph() {
        let mut table = Table::from_rows(&[&["x"]]);
        table.rows[0].cells[0] = Cell {
            properties: Some("<w:tcPr/>".into()),
            blocks: vec![
                Block::Paragraph(Paragraph::from_text("Rooms:")),
                Block::Paragraph(Paragraph::from_text("$rooms$")),
            ],
        };
        let mut document = Document {
            blocks: vec![Block::Table(table)],
        };

        substitute(
            &mut document,
            &PlaceholderMap::new().with(Token::Rooms, "bedroom, kitchen"),
            &RunStyle::default(),
        );

        let Block::Table(table) = &document.blocks[0] else {
            panic!("expected a table");
        };
        let cell = &table.rows[0].cells[0];
        assert_eq!(cell.paragraphs().count(), 1);
        assert_eq!(cell.text(), "Rooms:\nbedroom, kitchen");
        assert_eq!(cell.properties.as_deref(), Some("<w:tcPr/>"));
    }

    #[test]
    fn test_custom_style_is_applied() {
        let mut document = Document {
            blocks: vec![Block::Paragraph(Paragraph::from_text("$date$"))],
        };
        let style = RunStyle {
            font_family: "Calibri".into(),
            font_size_pt: 12,
        };
        substitute(
            &mut document,
            &PlaceholderMap::new().with(Token::Date, "2nd Jan. 2025"),
            &style,
        );
        let run = document.all_runs()[0];
        assert_eq!(run.properties.font_family.as_deref(), Some("Calibri"));
        assert_eq!(run.properties.size_half_points, Some(24));
    }
}

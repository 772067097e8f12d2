//! HTML preview of a filled receipt.

use std::sync::OnceLock;

use quick_xml::escape::escape;
use regex::Regex;
use serde::Serialize;

use crate::receipt::document::{Block, Document, Paragraph, Table};

/// Receipt dates as produced by `format_date`, e.g. "16th Dec. 2024".
const RECEIPT_DATE_PATTERN: &str = r"\d{1,2}[a-zA-Z]{2}\s[A-Za-z]+\.\s\d{4}";

const PREVIEW_CSS: &str = "<style>\
body { font-family: Arial, sans-serif; }\
.date-right { text-align: right; margin-bottom: 10px; font-family: Arial, sans-serif; }\
.other-content { text-align: left; font-family: Arial, sans-serif; }\
</style>";

/// Converts a document into previewable markup.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, document: &Document) -> String;
}

/// Plain paragraph/table HTML. Formatting beyond structure is not rendered.
pub struct HtmlRenderer;

impl DocumentRenderer for HtmlRenderer {
    fn render(&self, document: &Document) -> String {
        let mut html = String::new();
        render_blocks(&mut html, &document.blocks);
        html
    }
}

fn render_blocks(html: &mut String, blocks: &[Block]) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => render_paragraph(html, p),
            Block::Table(t) => render_table(html, t),
            Block::Raw(_) => {}
        }
    }
}

fn render_paragraph(html: &mut String, paragraph: &Paragraph) {
    let text = paragraph.text();
    if text.trim().is_empty() {
        return;
    }
    html.push_str("<p>");
    html.push_str(&escape(text.as_str()).replace('\n', "<br />"));
    html.push_str("</p>");
}

fn render_table(html: &mut String, table: &Table) {
    html.push_str("<table>");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in &row.cells {
            html.push_str("<td>");
            render_blocks(html, &cell.blocks);
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
}

fn receipt_date() -> &'static Regex {
    static DATE: OnceLock<Regex> = OnceLock::new();
    DATE.get_or_init(|| Regex::new(RECEIPT_DATE_PATTERN).expect("date pattern is valid"))
}

/// First receipt-style date found in `html`.
pub fn extract_date(html: &str) -> Option<&str> {
    receipt_date().find(html).map(|m| m.as_str())
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptPreview {
    pub filename: String,
    pub html: String,
}

/// Renders the page body for a preview: the receipt date pulled out into a
/// right-aligned block, everything else left-aligned below it.
pub fn build_preview(renderer: &dyn DocumentRenderer, document: &Document) -> String {
    let body = renderer.render(document);

    let (date_html, body) = match extract_date(&body) {
        Some(date) => (
            format!(r#"<div class="date-right">{date}</div>"#),
            body.replace(date, ""),
        ),
        None => (String::new(), body),
    };

    format!(r#"{PREVIEW_CSS}{date_html}<div class="other-content">{body}</div>"#)
}

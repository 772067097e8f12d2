// Receipt generation: validate the form, fill the .docx template, preview it.
// Everything here is synchronous and stateless; handlers.rs is the only async edge.

pub mod address;
pub mod date_format;
pub mod document;
pub mod docx;
pub mod handlers;
pub mod placeholders;
pub mod preview;
pub mod request;
pub mod templates;

use tracing::info;

use crate::catalog::Catalog;
use crate::errors::AppError;
use crate::receipt::docx::Docx;
use crate::receipt::placeholders::{substitute, RunStyle};
use crate::receipt::request::ReceiptRequest;
use crate::receipt::templates::TemplateLibrary;

/// A filled receipt ready for download or preview.
pub struct FilledReceipt {
    pub filename: String,
    pub docx: Docx,
}

/// Validates the request, loads its template and substitutes every token.
pub fn fill_receipt(
    request: &ReceiptRequest,
    catalog: &Catalog,
    templates: &TemplateLibrary,
    style: &RunStyle,
) -> Result<FilledReceipt, AppError> {
    let map = request.placeholder_map(catalog)?;
    let mut docx = templates.load(&request.template)?;
    let report = substitute(&mut docx.document, &map, style);

    info!(
        "Filled receipt for '{}' from {} ({} blocks rewritten)",
        request.address, request.template, report.rewritten_blocks
    );

    Ok(FilledReceipt {
        filename: request.filename(),
        docx,
    })
}

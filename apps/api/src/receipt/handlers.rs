use anyhow::Context;
use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;

use crate::catalog::Catalog;
use crate::errors::AppError;
use crate::receipt::docx::DOCX_MIME;
use crate::receipt::fill_receipt;
use crate::receipt::preview::{build_preview, ReceiptPreview};
use crate::receipt::request::ReceiptRequest;
use crate::state::AppState;

/// GET /api/v1/catalog
pub async fn handle_catalog(State(state): State<AppState>) -> Json<Catalog> {
    Json(state.catalog.as_ref().clone())
}

/// GET /api/v1/receipts/templates
pub async fn handle_list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.templates.list()?))
}

/// POST /api/v1/receipts
/// Responds with the filled document as an attachment.
pub async fn handle_generate_receipt(
    State(state): State<AppState>,
    Json(req): Json<ReceiptRequest>,
) -> Result<Response, AppError> {
    let filled = fill_receipt(&req, &state.catalog, &state.templates, &state.run_style)?;
    let bytes = Bytes::from(filled.docx.to_bytes()?);

    // Validated addresses are plain ASCII without quotes, so the name needs no encoding.
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        filled.filename
    ))
    .context("Receipt filename is not a valid header value")?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(DOCX_MIME)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// POST /api/v1/receipts/preview
pub async fn handle_preview_receipt(
    State(state): State<AppState>,
    Json(req): Json<ReceiptRequest>,
) -> Result<Json<ReceiptPreview>, AppError> {
    let filled = fill_receipt(&req, &state.catalog, &state.templates, &state.run_style)?;
    let html = build_preview(state.renderer.as_ref(), &filled.docx.document);

    Ok(Json(ReceiptPreview {
        filename: filled.filename,
        html,
    }))
}

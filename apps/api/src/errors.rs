use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::orders::StoreError;
use crate::quotation::QuotationError;
use crate::receipt::address::AddressError;
use crate::receipt::docx::TemplateError;
use crate::receipt::request::ReceiptError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AddressError> for AppError {
    fn from(e: AddressError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<ReceiptError> for AppError {
    fn from(e: ReceiptError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<QuotationError> for AppError {
    fn from(e: QuotationError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<TemplateError> for AppError {
    fn from(e: TemplateError) -> Self {
        match e {
            TemplateError::NotFound(name) => AppError::NotFound(format!("Template {name} not found")),
            TemplateError::InvalidName(name) => {
                AppError::Validation(format!("Invalid template name: {name}"))
            }
            other => AppError::Template(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => AppError::NotFound(format!("Work order {id} not found")),
            other => AppError::Persistence(other.to_string()),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::ExternalService(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => {
                tracing::warn!("Not found: {msg}");
                (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone())
            }
            AppError::Validation(msg) => {
                tracing::warn!("Validation error: {msg}");
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Persistence(msg) => {
                tracing::error!("Persistence error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    msg.clone(),
                )
            }
            AppError::ExternalService(msg) => {
                tracing::error!("External service error: {msg}");
                (StatusCode::BAD_GATEWAY, "EXTERNAL_SERVICE_ERROR", msg.clone())
            }
            AppError::Template(msg) => {
                tracing::error!("Template error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "TEMPLATE_ERROR",
                    msg.clone(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::copywriting::prompts::COPY_SYSTEM;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CopyRequest {
    pub requirement: String,
}

#[derive(Serialize)]
pub struct CopyResponse {
    pub content: String,
}

/// POST /api/v1/copy
pub async fn handle_generate_copy(
    State(state): State<AppState>,
    Json(req): Json<CopyRequest>,
) -> Result<Json<CopyResponse>, AppError> {
    if req.requirement.trim().is_empty() {
        return Err(AppError::Validation(
            "Please describe what the copy should say".into(),
        ));
    }

    let content = state
        .copy_writer
        .generate_copy(COPY_SYSTEM, &req.requirement)
        .await?;
    info!("Generated {} characters of copy", content.chars().count());

    Ok(Json(CopyResponse { content }))
}

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::quotation::pricing::{Quotation, QuotationLineItem};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddOnSelection {
    pub name: String,
    /// Overrides the catalog price when present.
    #[serde(default)]
    pub price: Option<Decimal>,
}

#[derive(Deserialize)]
pub struct QuotationRequest {
    pub base_plan: String,
    #[serde(default)]
    pub base_price: Option<Decimal>,
    #[serde(default)]
    pub add_ons: Vec<AddOnSelection>,
}

#[derive(Serialize)]
pub struct QuotationResponse {
    pub base_plan: QuotationLineItem,
    pub add_ons: Vec<QuotationLineItem>,
    pub total: Decimal,
}

/// POST /api/v1/quotations
pub async fn handle_quote(
    State(state): State<AppState>,
    Json(req): Json<QuotationRequest>,
) -> Result<Json<QuotationResponse>, AppError> {
    let add_ons: Vec<(String, Option<Decimal>)> = req
        .add_ons
        .into_iter()
        .map(|a| (a.name, a.price))
        .collect();
    let quotation =
        Quotation::from_selection(&state.catalog, &req.base_plan, req.base_price, &add_ons)?;
    let total = quotation.total()?;

    Ok(Json(QuotationResponse {
        base_plan: quotation.base_plan,
        add_ons: quotation.add_ons,
        total,
    }))
}

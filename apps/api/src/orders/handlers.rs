use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::orders::models::{NewWorkOrder, OrderId, WorkOrder};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddressQuery {
    pub address: String,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: OrderId,
}

#[derive(Serialize)]
pub struct AffectedResponse {
    pub rows_affected: u64,
}

#[derive(Serialize)]
pub struct TotalResponse {
    pub total_final_price: Decimal,
}

/// Rejects orders the store should never see.
fn validate(order: &NewWorkOrder) -> Result<(), AppError> {
    if order.address.trim().is_empty() {
        return Err(AppError::Validation("Address must not be empty".into()));
    }
    if order.sales_price < Decimal::ZERO {
        return Err(AppError::Validation("sales_price must not be negative".into()));
    }
    if order.final_price < Decimal::ZERO {
        return Err(AppError::Validation("final_price must not be negative".into()));
    }
    Ok(())
}

/// GET /api/v1/work-orders
pub async fn handle_list(State(state): State<AppState>) -> Result<Json<Vec<WorkOrder>>, AppError> {
    Ok(Json(state.store.list_all().await?))
}

/// POST /api/v1/work-orders
pub async fn handle_create(
    State(state): State<AppState>,
    Json(order): Json<NewWorkOrder>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    validate(&order)?;
    let id = state.store.insert(&order).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// GET /api/v1/work-orders/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<WorkOrder>, AppError> {
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Work order {id} not found")))
}

/// PUT /api/v1/work-orders/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(order): Json<NewWorkOrder>,
) -> Result<StatusCode, AppError> {
    validate(&order)?;
    state.store.update(id, &order).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/work-orders/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<StatusCode, AppError> {
    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/work-orders/by-address?address=
/// Every order at the address receives the same values.
pub async fn handle_update_by_address(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
    Json(order): Json<NewWorkOrder>,
) -> Result<Json<AffectedResponse>, AppError> {
    validate(&order)?;
    let rows_affected = state.store.update_by_address(&query.address, &order).await?;
    Ok(Json(AffectedResponse { rows_affected }))
}

/// DELETE /api/v1/work-orders/by-address?address=
pub async fn handle_delete_by_address(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<AffectedResponse>, AppError> {
    let rows_affected = state.store.delete_by_address(&query.address).await?;
    Ok(Json(AffectedResponse { rows_affected }))
}

/// GET /api/v1/work-orders/total
pub async fn handle_total(State(state): State<AppState>) -> Result<Json<TotalResponse>, AppError> {
    Ok(Json(TotalResponse {
        total_final_price: state.store.total_final_price().await?,
    }))
}

/// GET /api/v1/work-orders/addresses
pub async fn handle_addresses(
    State(state): State<AppState>,
) -> Result<Json<BTreeSet<String>>, AppError> {
    Ok(Json(state.store.list_distinct_addresses().await?))
}

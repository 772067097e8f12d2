pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::copywriting::handlers as copywriting;
use crate::orders::handlers as orders;
use crate::quotation::handlers as quotation;
use crate::receipt::handlers as receipt;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/catalog", get(receipt::handle_catalog))
        // Receipts
        .route(
            "/api/v1/receipts/templates",
            get(receipt::handle_list_templates),
        )
        .route("/api/v1/receipts", post(receipt::handle_generate_receipt))
        .route(
            "/api/v1/receipts/preview",
            post(receipt::handle_preview_receipt),
        )
        // Quotations and copy
        .route("/api/v1/quotations", post(quotation::handle_quote))
        .route("/api/v1/copy", post(copywriting::handle_generate_copy))
        // Work orders
        .route(
            "/api/v1/work-orders",
            get(orders::handle_list).post(orders::handle_create),
        )
        .route("/api/v1/work-orders/total", get(orders::handle_total))
        .route(
            "/api/v1/work-orders/addresses",
            get(orders::handle_addresses),
        )
        .route(
            "/api/v1/work-orders/by-address",
            put(orders::handle_update_by_address)
                .delete(orders::handle_delete_by_address),
        )
        .route(
            "/api/v1/work-orders/:id",
            get(orders::handle_get)
                .put(orders::handle_update)
                .delete(orders::handle_delete),
        )
        .with_state(state)
}

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use stockroom_ledger::entry;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/get_inventory", post(get_inventory))
        .route("/get_stats", post(get_stats))
        .route("/add_stock_quantity", post(add_stock_quantity))
        .route("/add_stock_entry", post(add_stock_entry))
        .route("/issue_stock", post(issue_stock))
        .route("/set_stock_threshold", post(set_stock_threshold))
}

pub async fn get_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::GetInventoryRequest>,
) -> axum::response::Response {
    let page = match dto::validate_page(body.page, "page") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let page_size = match dto::validate_page(body.page_size, "pageSize") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.list_items(page, page_size, body.search.as_deref()) {
        Ok((items, total_count)) => (
            StatusCode::OK,
            Json(dto::InventoryResponse { items, total_count }),
        )
            .into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn get_stats(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store.stats() {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

/// Manual addition to an existing item; provenance is recorded through the
/// fixed manual-addition reference.
pub async fn add_stock_quantity(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::AddStockQuantityRequest>,
) -> axum::response::Response {
    let stock_id = match dto::parse_stock_id(&body.stock_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.quantity.receive(
        stock_id,
        body.quantity,
        entry::MANUAL_ADDITION_REFERENCE,
        body.user,
    ) {
        Ok(committed) => (StatusCode::OK, Json(committed)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

/// Single-row receive that merges into existing stock or creates a new item
/// by the same identity rule as a bulk upload.
pub async fn add_stock_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::AddStockEntryRequest>,
) -> axum::response::Response {
    match services.matcher.receive_row(body.row, &body.user) {
        Ok((stock_id, ledger_id)) => (
            StatusCode::CREATED,
            Json(dto::AddStockEntryResponse { stock_id, ledger_id }),
        )
            .into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn issue_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::IssueStockRequest>,
) -> axum::response::Response {
    let stock_id = match dto::parse_stock_id(&body.stock_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.quantity.issue(
        stock_id,
        body.quantity,
        body.reference,
        body.reason,
        body.user,
    ) {
        Ok(committed) => (StatusCode::OK, Json(committed)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn set_stock_threshold(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SetStockThresholdRequest>,
) -> axum::response::Response {
    let stock_id = match dto::parse_stock_id(&body.stock_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.quantity.set_threshold(stock_id, body.min_quantity, body.user) {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

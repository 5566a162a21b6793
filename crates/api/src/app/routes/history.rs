use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/get_history", post(get_history))
        .route("/get_export_history", post(get_export_history))
        .route("/reverse_transaction", post(reverse_transaction))
}

pub async fn get_history(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::GetHistoryRequest>,
) -> axum::response::Response {
    let page = match dto::validate_page(body.page, "page") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let page_size = match dto::validate_page(body.page_size, "pageSize") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.list_history(page, page_size, body.search.as_deref()) {
        Ok((items, total_count)) => (
            StatusCode::OK,
            Json(dto::HistoryResponse { items, total_count }),
        )
            .into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

/// Unpaged audit rows for export, optionally narrowed by calendar-date
/// range and entry type.
pub async fn get_export_history(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::GetExportHistoryRequest>,
) -> axum::response::Response {
    let date_from = match dto::parse_date("dateFrom", body.date_from.as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let date_to = match dto::parse_date("dateTo", body.date_to.as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let type_filter = match dto::parse_type_filter(body.status.as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.export_history(date_from, date_to, type_filter) {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn reverse_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ReverseTransactionRequest>,
) -> axum::response::Response {
    match services.reversal.reverse(body.ledger_id, body.user) {
        Ok(reversal) => (StatusCode::OK, Json(reversal)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

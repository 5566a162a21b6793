use axum::http::StatusCode;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::{LedgerId, StockId};
use stockroom_ledger::{HistoryEntry, ImportClassification, ImportRow, StockItem, TransactionType};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------
//
// Wire parameter names are camelCase (`pageSize`, `stockId`, ...); response
// bodies keep the snake_case field names of the domain types they serialize.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetInventoryRequest {
    pub page: i64,
    pub page_size: i64,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStockQuantityRequest {
    pub stock_id: String,
    pub quantity: Decimal,
    pub user: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStockEntryRequest {
    pub row: ImportRow,
    pub user: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueStockRequest {
    pub stock_id: String,
    pub quantity: Decimal,
    pub reference: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub user: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStockThresholdRequest {
    pub stock_id: String,
    pub min_quantity: Decimal,
    pub user: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetHistoryRequest {
    pub page: i64,
    pub page_size: i64,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetExportHistoryRequest {
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseTransactionRequest {
    pub ledger_id: LedgerId,
    pub user: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUploadPreviewRequest {
    pub rows: Vec<ImportRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmBulkUploadRequest {
    pub previews: Vec<ImportClassification>,
    pub user: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub items: Vec<StockItem>,
    pub total_count: usize,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub items: Vec<HistoryEntry>,
    pub total_count: usize,
}

/// Where a single committed row landed.
#[derive(Debug, Serialize)]
pub struct AddStockEntryResponse {
    pub stock_id: StockId,
    pub ledger_id: LedgerId,
}

// -------------------------
// Parameter parsing helpers
// -------------------------

pub fn validate_page(value: i64, name: &'static str) -> Result<usize, axum::response::Response> {
    if value < 1 {
        return Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("{name} must be at least 1"),
        ));
    }
    Ok(value as usize)
}

pub fn parse_stock_id(raw: &str) -> Result<StockId, axum::response::Response> {
    raw.parse::<StockId>().map_err(errors::ledger_error_to_response)
}

/// `YYYY-MM-DD`, with blank treated the same as absent.
pub fn parse_date(
    name: &'static str,
    raw: Option<&str>,
) -> Result<Option<NaiveDate>, axum::response::Response> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(Some).map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("{name} must be YYYY-MM-DD"),
        )
    })
}

/// Entry type filter; blank or "All" means no filter.
pub fn parse_type_filter(
    raw: Option<&str>,
) -> Result<Option<TransactionType>, axum::response::Response> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if raw.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    raw.parse::<TransactionType>()
        .map(Some)
        .map_err(errors::ledger_error_to_response)
}

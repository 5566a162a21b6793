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
        .route("/bulk_upload_preview", post(bulk_upload_preview))
        .route("/confirm_bulk_upload", post(confirm_bulk_upload))
}

/// Classify a batch without committing anything. The client shows the
/// result to the operator and posts it back to `confirm_bulk_upload`.
pub async fn bulk_upload_preview(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::BulkUploadPreviewRequest>,
) -> axum::response::Response {
    match services.matcher.classify(body.rows) {
        Ok(previews) => (StatusCode::OK, Json(previews)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn confirm_bulk_upload(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ConfirmBulkUploadRequest>,
) -> axum::response::Response {
    match services.matcher.commit(body.previews, &body.user) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

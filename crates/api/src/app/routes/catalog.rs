use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/sections", get(list_sections))
        .route("/leakage-items", get(list_leakage_items))
}

/// Ordered checklist sections with their ordered items.
pub async fn list_sections(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.catalog().await {
        Ok(catalog) => (
            StatusCode::OK,
            Json(dto::ItemsResponse::new(catalog.sections().to_vec())),
        )
            .into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn list_leakage_items(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog().await {
        Ok(catalog) => (
            StatusCode::OK,
            Json(dto::ItemsResponse::new(catalog.leakage_items().to_vec())),
        )
            .into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

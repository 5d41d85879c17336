use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_reports))
        .route("/:id", get(get_report))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportFilter {
    /// Only inspections with a fail, warn or leak finding.
    #[serde(default)]
    pub findings: bool,
}

/// Report rows, most recently updated first. Eventually consistent with writes.
pub async fn list_reports(
    Extension(services): Extension<Arc<AppServices>>,
    Query(filter): Query<ReportFilter>,
) -> axum::response::Response {
    let rows = if filter.findings {
        services.reports.with_findings()
    } else {
        services.reports.list()
    };
    (StatusCode::OK, Json(dto::ItemsResponse::new(rows))).into_response()
}

pub async fn get_report(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_inspection_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.reports.get(&id) {
        Some(row) => (StatusCode::OK, Json(row)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "report not found"),
    }
}

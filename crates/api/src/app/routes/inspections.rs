use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use pdi_infra::{InspectionStore, SubmissionError};
use pdi_inspection::InspectionPayload;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_inspection))
        .route("/:id", get(get_inspection).put(update_inspection))
}

pub async fn create_inspection(
    Extension(services): Extension<Arc<AppServices>>,
    Json(payload): Json<InspectionPayload>,
) -> axum::response::Response {
    match services.pipeline.submit(&payload).await {
        Ok(receipt) => (StatusCode::CREATED, Json(dto::SubmittedResponse::from(receipt))).into_response(),
        Err(e) => errors::submission_error_to_response(e),
    }
}

pub async fn update_inspection(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(payload): Json<InspectionPayload>,
) -> axum::response::Response {
    let id = match errors::parse_inspection_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.pipeline.submit_update(&payload, id).await {
        Ok(receipt) => (StatusCode::OK, Json(dto::SubmittedResponse::from(receipt))).into_response(),
        Err(e) => errors::submission_error_to_response(e),
    }
}

pub async fn get_inspection(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_inspection_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.pipeline.store().load(id).await {
        Ok(Some(inspection)) => match dto::InspectionView::from_inspection(inspection) {
            Some(view) => (StatusCode::OK, Json(view)).into_response(),
            None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "inspection not found"),
        },
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "inspection not found"),
        Err(e) => errors::submission_error_to_response(SubmissionError::from(e)),
    }
}

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pdi_infra::{CatalogError, SubmissionError};

pub fn submission_error_to_response(err: SubmissionError) -> axum::response::Response {
    let retryable = err.is_retryable();
    match err {
        SubmissionError::Rejected(v) => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "validation_error",
                "message": v.to_string(),
                "fields": v.field_names(),
            })),
        )
            .into_response(),
        SubmissionError::NotFound(id) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("inspection {id} not found"))
        }
        SubmissionError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        SubmissionError::Invalid(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_submission", msg)
        }
        SubmissionError::Storage(msg) => (
            StatusCode::SERVICE_UNAVAILABLE,
            axum::Json(json!({
                "error": "storage_error",
                "message": msg,
                "retryable": retryable,
            })),
        )
            .into_response(),
    }
}

pub fn catalog_error_to_response(err: CatalogError) -> axum::response::Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        axum::Json(json!({
            "error": "catalog_unavailable",
            "message": err.to_string(),
            "retryable": err.is_retryable(),
        })),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_inspection_id(raw: &str) -> Result<pdi_inspection::InspectionId, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid inspection id"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_refusal_and_outage_get_distinct_statuses() {
        let refused = submission_error_to_response(SubmissionError::Invalid("bad odometer".into()));
        assert_eq!(refused.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let outage = submission_error_to_response(SubmissionError::Storage("connection reset".into()));
        assert_eq!(outage.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

use axum::{routing::get, Router};

pub mod catalog;
pub mod inspections;
pub mod reports;
pub mod system;

/// Router for all `/pdi` endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/catalog", catalog::router())
        .nest("/inspections", inspections::router())
        .nest("/reports", reports::router())
}

/// Routes that need no services.
pub fn system_router() -> Router {
    Router::new().route("/health", get(system::health))
}

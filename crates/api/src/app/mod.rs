//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: infrastructure wiring (event store/bus, report projection, pipeline)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use pdi_infra::PdiConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &PdiConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config)?);
    Ok(build_app_with(services))
}

/// Router over already wired services.
pub fn build_app_with(services: Arc<AppServices>) -> Router {
    Router::new()
        .merge(routes::system_router())
        .nest("/pdi", routes::router().layer(Extension(services)))
        .layer(ServiceBuilder::new())
}

pub use services::AppServices;

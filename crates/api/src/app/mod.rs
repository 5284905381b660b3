//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and service construction
//! - `routes/`: handlers, grouped by area
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use storefront_infra::Settings;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, ServicesError};

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub async fn build_app(settings: &Settings) -> Result<Router, ServicesError> {
    let services = services::build_services(settings).await?;
    Ok(build_app_with(services))
}

/// Build the router around already constructed services.
pub fn build_app_with(services: AppServices) -> Router {
    let auth = services.auth_state();
    let services = Arc::new(services);

    Router::new()
        .merge(routes::public_router())
        .merge(routes::protected_router(auth))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(services)),
        )
}

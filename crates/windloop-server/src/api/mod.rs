//! HTTP API for the windloop server.

mod error;
pub mod request_id;
mod routes;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub use error::ApiError;
pub use routes::{GenerateRouteRequest, SnapRouteRequest};

pub fn routes() -> Router<Arc<AppState>> {
    routes::create_router()
}

/// The full service: API routes, health check and middleware.
pub fn app(state: Arc<AppState>) -> Router {
    routes()
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id::ensure_request_id))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests;

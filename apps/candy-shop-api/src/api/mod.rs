//! API routes module

pub mod catalog;
pub mod health;

use axum::{Router, middleware, routing::get};
use axum_helpers::server::{create_router, health_router};
use observability::{metrics_handler, metrics_middleware};
use std::io;

use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix is added by `axum_helpers::create_router`.
pub fn routes(state: &AppState) -> Router {
    catalog::router(state)
}

/// `/ready` with a real database ping. Merged outside `/api`.
pub fn ready_router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}

/// Prometheus scrape endpoint
pub fn metrics_router() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

/// The complete HTTP application: `/api`, docs, health, readiness and metrics.
pub fn app(state: AppState) -> io::Result<Router> {
    let router = create_router::<ApiDoc>(routes(&state), &state.config.cors)?
        .merge(health_router(state.config.app))
        .merge(ready_router(state))
        .merge(metrics_router())
        .layer(middleware::from_fn(metrics_middleware));

    Ok(router)
}

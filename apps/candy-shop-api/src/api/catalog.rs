//! Catalog API routes

use axum::Router;
use domain_catalog::{CatalogService, PgCatalogRepository, handlers};

use crate::state::AppState;

/// Catalog router backed by PostgreSQL; mutations require a bearer token
pub fn router(state: &AppState) -> Router {
    let repository = PgCatalogRepository::new(state.db.clone());
    let service = CatalogService::new(repository);
    handlers::router_with_auth(service, state.jwt.clone())
}

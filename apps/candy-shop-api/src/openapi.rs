//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for the Candy Shop API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Candy Shop API",
        version = "0.1.0",
        description = "Product catalog for the candy shop storefront",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api", api = domain_catalog::ApiDoc)
    )
)]
pub struct ApiDoc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, Caller, IdPath, JwtAuth, ValidatedJson,
    errors::responses::{
        BadRequestResponse, BadRequestValidationResponse, InternalServerErrorResponse,
        NotFoundResponse, UnauthorizedResponse,
    },
    jwt_auth_middleware,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::error::CatalogResult;
use crate::models::{
    BulkProductsRequest, Category, CreateCategory, CreateProduct, Product, ProductFilter,
    SearchQuery, UpdateProduct,
};
use crate::repository::CatalogRepository;
use crate::service::CatalogService;

pub const PRODUCTS_TAG: &str = "Products";
pub const CATEGORIES_TAG: &str = "Categories";

/// Name of the bearer scheme required by mutating endpoints
pub const BEARER_AUTH: &str = "bearer_auth";

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                BEARER_AUTH,
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation for the catalog API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        create_category,
        delete_product,
        update_product,
        get_product,
        search_products,
        get_multiple_products,
        list_categories,
        delete_category,
    ),
    components(
        schemas(
            Product,
            Category,
            CreateProduct,
            UpdateProduct,
            CreateCategory,
            BulkProductsRequest
        ),
        responses(
            NotFoundResponse,
            BadRequestResponse,
            BadRequestValidationResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = PRODUCTS_TAG, description = "Candy catalog products"),
        (name = CATEGORIES_TAG, description = "Product categories")
    )
)]
pub struct ApiDoc;

type SharedService<R> = Arc<CatalogService<R>>;

fn read_routes<R: CatalogRepository + 'static>(service: SharedService<R>) -> Router {
    Router::new()
        .route("/products/", get(list_products))
        .route("/individual_product/{id}/", get(get_product))
        .route("/search_product/", get(search_products))
        .route("/get_multiple_products/", post(get_multiple_products))
        .route("/categories/", get(list_categories))
        .with_state(service)
}

fn write_routes<R: CatalogRepository + 'static>(service: SharedService<R>) -> Router {
    Router::new()
        .route("/add_product/", post(create_product))
        .route("/add_category/", post(create_category))
        .route("/update_product/{id}/", patch(update_product))
        .route("/delete_product/{id}/", delete(delete_product))
        .route("/delete_category/{id}/", delete(delete_category))
        .with_state(service)
}

/// Catalog router with every endpoint open. Used for local tooling and tests.
pub fn router<R: CatalogRepository + 'static>(service: CatalogService<R>) -> Router {
    let shared_service = Arc::new(service);

    read_routes(shared_service.clone()).merge(write_routes(shared_service))
}

/// Catalog router where mutating endpoints require a valid bearer token
pub fn router_with_auth<R: CatalogRepository + 'static>(
    service: CatalogService<R>,
    auth: JwtAuth,
) -> Router {
    let shared_service = Arc::new(service);

    let protected = write_routes(shared_service.clone())
        .route_layer(from_fn_with_state(auth, jwt_auth_middleware));

    read_routes(shared_service).merge(protected)
}

/// List products, optionally by category name
#[utoipa::path(
    get,
    path = "/products/",
    tag = PRODUCTS_TAG,
    params(ProductFilter),
    responses(
        (status = 200, description = "Products in ascending id order", body = Vec<Product>),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: CatalogRepository>(
    State(service): State<SharedService<R>>,
    Query(filter): Query<ProductFilter>,
) -> CatalogResult<Json<Vec<Product>>> {
    let products = service.list_products(filter).await?;
    Ok(Json(products))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/add_product/",
    tag = PRODUCTS_TAG,
    request_body = CreateProduct,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: CatalogRepository>(
    State(service): State<SharedService<R>>,
    caller: Caller,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> CatalogResult<impl IntoResponse> {
    let product = service.create_product(input).await?;

    AuditEvent::new(
        caller.subject(),
        "product.create",
        Some(format!("product:{}", product.id)),
        AuditOutcome::Success,
    )
    .with_request_headers(&headers)
    .with_details(json!({
        "name": product.name,
        "category": product.category,
        "price": product.price,
    }))
    .log();

    Ok((StatusCode::CREATED, Json(product)))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/add_category/",
    tag = CATEGORIES_TAG,
    request_body = CreateCategory,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_category<R: CatalogRepository>(
    State(service): State<SharedService<R>>,
    caller: Caller,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateCategory>,
) -> CatalogResult<impl IntoResponse> {
    let category = service.create_category(input).await?;

    AuditEvent::new(
        caller.subject(),
        "category.create",
        Some(format!("category:{}", category.id)),
        AuditOutcome::Success,
    )
    .with_request_headers(&headers)
    .with_details(json!({ "name": category.name }))
    .log();

    Ok((StatusCode::CREATED, Json(category)))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/delete_product/{id}/",
    tag = PRODUCTS_TAG,
    params(("id" = i32, Path, description = "Product ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: CatalogRepository>(
    State(service): State<SharedService<R>>,
    caller: Caller,
    headers: HeaderMap,
    IdPath(id): IdPath,
) -> CatalogResult<impl IntoResponse> {
    service.delete_product(id).await?;

    AuditEvent::new(
        caller.subject(),
        "product.delete",
        Some(format!("product:{}", id)),
        AuditOutcome::Success,
    )
    .with_request_headers(&headers)
    .log();

    Ok(StatusCode::NO_CONTENT)
}

/// Partially update a product
///
/// Only the fields present in the body are changed.
#[utoipa::path(
    patch,
    path = "/update_product/{id}/",
    tag = PRODUCTS_TAG,
    params(("id" = i32, Path, description = "Product ID")),
    request_body = UpdateProduct,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: CatalogRepository>(
    State(service): State<SharedService<R>>,
    caller: Caller,
    headers: HeaderMap,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdateProduct>,
) -> CatalogResult<Json<Product>> {
    let product = service.update_product(id, input).await?;

    AuditEvent::new(
        caller.subject(),
        "product.update",
        Some(format!("product:{}", id)),
        AuditOutcome::Success,
    )
    .with_request_headers(&headers)
    .log();

    Ok(Json(product))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/individual_product/{id}/",
    tag = PRODUCTS_TAG,
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: CatalogRepository>(
    State(service): State<SharedService<R>>,
    IdPath(id): IdPath,
) -> CatalogResult<Json<Product>> {
    let product = service.get_product(id).await?;
    Ok(Json(product))
}

/// Search products by name
#[utoipa::path(
    get,
    path = "/search_product/",
    tag = PRODUCTS_TAG,
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching products", body = Vec<Product>),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search_products<R: CatalogRepository>(
    State(service): State<SharedService<R>>,
    Query(query): Query<SearchQuery>,
) -> CatalogResult<Json<Vec<Product>>> {
    let products = service.search_products(query).await?;
    Ok(Json(products))
}

/// Fetch several products by id
#[utoipa::path(
    post,
    path = "/get_multiple_products/",
    tag = PRODUCTS_TAG,
    request_body = BulkProductsRequest,
    responses(
        (status = 200, description = "Products that exist, ascending id", body = Vec<Product>),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_multiple_products<R: CatalogRepository>(
    State(service): State<SharedService<R>>,
    ValidatedJson(request): ValidatedJson<BulkProductsRequest>,
) -> CatalogResult<Json<Vec<Product>>> {
    let products = service.get_products_by_ids(request).await?;
    Ok(Json(products))
}

/// List all categories
#[utoipa::path(
    get,
    path = "/categories/",
    tag = CATEGORIES_TAG,
    responses(
        (status = 200, description = "Categories in ascending id order", body = Vec<Category>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_categories<R: CatalogRepository>(
    State(service): State<SharedService<R>>,
) -> CatalogResult<Json<Vec<Category>>> {
    let categories = service.list_categories().await?;
    Ok(Json(categories))
}

/// Delete a category and all of its products
#[utoipa::path(
    delete,
    path = "/delete_category/{id}/",
    tag = CATEGORIES_TAG,
    params(("id" = i32, Path, description = "Category ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Category and its products deleted"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_category<R: CatalogRepository>(
    State(service): State<SharedService<R>>,
    caller: Caller,
    headers: HeaderMap,
    IdPath(id): IdPath,
) -> CatalogResult<impl IntoResponse> {
    service.delete_category(id).await?;

    AuditEvent::new(
        caller.subject(),
        "category.delete",
        Some(format!("category:{}", id)),
        AuditOutcome::Success,
    )
    .with_request_headers(&headers)
    .log();

    Ok(StatusCode::NO_CONTENT)
}

//! Handler tests for the catalog domain
//!
//! These drive the catalog router directly over the in-memory repository:
//! - Request deserialization and validation
//! - Status codes and JSON bodies
//! - Bearer token enforcement on mutating routes
//!
//! Postgres-specific behavior lives in `integration_test.rs`.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum_helpers::{ACCESS_TOKEN_TTL, JwtAuth, JwtConfig};
use domain_catalog::*;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use test_utils::TestDataBuilder;
use tower::ServiceExt; // For oneshot()

const SECRET: &str = "handler-test-secret-that-is-long-enough";

// Helper to parse JSON response body
async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn app() -> Router {
    handlers::router(CatalogService::new(InMemoryCatalogRepository::new()))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn product_body(builder: &TestDataBuilder, suffix: &str) -> Value {
    json!({
        "name": builder.product_name(suffix),
        "description": "A sweet treat",
        "price": "2.50",
        "image_url": builder.image_url(suffix),
    })
}

async fn create_product(app: &Router, body: Value) -> Product {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/add_product/", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response.into_body()).await
}

async fn create_category(app: &Router, name: &str) -> Category {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/add_category/", json!({ "name": name })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response.into_body()).await
}

#[tokio::test]
async fn test_create_product_returns_201_with_defaults() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("create_201");

    let product = create_product(
        &app,
        json!({
            "name": builder.product_name("worms"),
            "description": "Sour gummy worms",
            "price": 4.5,
            "image_url": builder.image_url("worms"),
        }),
    )
    .await;

    assert_eq!(product.name, builder.product_name("worms"));
    assert_eq!(product.category, DEFAULT_CATEGORY_ID);
    assert_eq!(product.price, Decimal::from_str("4.50").unwrap());
    assert!(product.price_id.is_none());
    assert_eq!(product.created_at, product.updated_at);
}

#[tokio::test]
async fn test_price_is_serialized_with_two_decimals() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("price_format");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/add_product/",
            json!({
                "name": builder.product_name("taffy"),
                "description": "Salt water taffy",
                "price": 3,
                "image_url": builder.image_url("taffy"),
            }),
        ))
        .await
        .unwrap();
    let body: Value = json_body(response.into_body()).await;

    assert_eq!(body["price"], json!("3.00"));
}

#[tokio::test]
async fn test_create_product_missing_name_is_rejected_without_partial_record() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("missing_name");

    let mut body = product_body(&builder, "nameless");
    body.as_object_mut().unwrap().remove("name");

    let response = app
        .clone()
        .oneshot(json_request("POST", "/add_product/", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: Value = json_body(response.into_body()).await;
    assert_eq!(error["error"], "VALIDATION_ERROR");
    assert!(error["details"]["name"].is_array());

    let response = app.oneshot(get("/products/")).await.unwrap();
    let products: Vec<Product> = json_body(response.into_body()).await;
    assert!(products.is_empty());
}

#[tokio::test]
async fn test_create_product_rejects_bad_price_and_url() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("bad_fields");

    let mut body = product_body(&builder, "bad");
    body["price"] = json!("1.999");
    let response = app
        .clone()
        .oneshot(json_request("POST", "/add_product/", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = json_body(response.into_body()).await;
    assert!(error["details"]["price"].is_array());

    let mut body = product_body(&builder, "bad");
    body["image_url"] = json!("not-a-url");
    let response = app
        .oneshot(json_request("POST", "/add_product/", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_image_url_scheme_must_be_web_or_ftp() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("url_scheme");

    for image_url in ["javascript:alert(1)", "mailto:x@y.z", "foo:bar", "file:///etc/passwd"] {
        let mut body = product_body(&builder, "scheme");
        body["image_url"] = json!(image_url);
        let response = app
            .clone()
            .oneshot(json_request("POST", "/add_product/", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{image_url}");

        let error: Value = json_body(response.into_body()).await;
        assert!(error["details"]["image_url"].is_array());
    }

    let mut body = product_body(&builder, "ftp");
    body["image_url"] = json!("ftp://files.example.com/ftp.png");
    let product = create_product(&app, body).await;

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/update_product/{}/", product.id),
            json!({ "image_url": "javascript:alert(1)" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_product_with_unknown_category_is_field_error() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("unknown_category");

    let mut body = product_body(&builder, "orphan");
    body["category"] = json!(999);

    let response = app
        .oneshot(json_request("POST", "/add_product/", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: Value = json_body(response.into_body()).await;
    assert!(error["details"]["category"].is_array());
}

#[tokio::test]
async fn test_malformed_json_returns_structured_400() {
    let app = app();

    let request = Request::builder()
        .method("POST")
        .uri("/add_product/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: Value = json_body(response.into_body()).await;
    assert_eq!(error["error"], "INVALID_JSON");
}

#[tokio::test]
async fn test_get_deleted_product_returns_404() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("get_deleted");
    let product = create_product(&app, product_body(&builder, "gone")).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/individual_product/{}/", product.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(delete(&format!("/delete_product/{}/", product.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get(&format!("/individual_product/{}/", product.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(delete(&format!("/delete_product/{}/", product.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_numeric_id_returns_404() {
    let app = app();

    for uri in ["/individual_product/abc/", "/individual_product/-3/"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn test_filter_by_category_name() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("filter_category");

    let gummies = create_category(&app, &builder.category_name("gummies")).await;

    let mut body = product_body(&builder, "bears");
    body["category"] = json!(gummies.id);
    let bears = create_product(&app, body).await;
    create_product(&app, product_body(&builder, "bar")).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/products/?category={}", gummies.name)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let products: Vec<Product> = json_body(response.into_body()).await;
    assert_eq!(products, vec![bears]);

    let response = app.oneshot(get("/products/?category=")).await.unwrap();
    let products: Vec<Product> = json_body(response.into_body()).await;
    assert_eq!(products.len(), 2);
}

#[tokio::test]
async fn test_filter_by_unknown_category_returns_404() {
    let app = app();

    let response = app
        .oneshot(get("/products/?category=Nonexistent"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_lookup_ignores_invalid_ids() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("bulk_lookup");

    let first = create_product(&app, product_body(&builder, "one")).await;
    let second = create_product(&app, product_body(&builder, "two")).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/get_multiple_products/",
            json!({ "ids": [second.id, -5, "abc", first.id, first.id] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let products: Vec<Product> = json_body(response.into_body()).await;
    assert_eq!(products, vec![first, second]);
}

#[tokio::test]
async fn test_bulk_lookup_rejects_invalid_shapes() {
    let app = app();

    let too_many: Vec<i32> = (1..=101).collect();
    for body in [
        json!({ "ids": too_many }),
        json!({ "ids": [] }),
        json!({}),
        json!({ "ids": ["x", 0, -1] }),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/get_multiple_products/", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
    }
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_404_when_empty() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("search");

    let mut body = product_body(&builder, "x");
    body["name"] = json!("Chocolate Truffle");
    let truffle = create_product(&app, body).await;
    create_product(&app, product_body(&builder, "licorice")).await;

    let response = app
        .clone()
        .oneshot(get("/search_product/?search_product=TRUFF"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let products: Vec<Product> = json_body(response.into_body()).await;
    assert_eq!(products, vec![truffle]);

    for uri in [
        "/search_product/?search_product=",
        "/search_product/",
        "/search_product/?search_product=jawbreaker",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn test_partial_update_changes_only_price() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("partial_update");
    let original = create_product(&app, product_body(&builder, "fudge")).await;

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/update_product/{}/", original.id),
            json!({ "price": "9.99" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let updated: Product = json_body(response.into_body()).await;
    assert_eq!(updated.price, Decimal::from_str("9.99").unwrap());
    assert_eq!(updated.name, original.name);
    assert_eq!(updated.description, original.description);
    assert_eq!(updated.image_url, original.image_url);
    assert_eq!(updated.category, original.category);
    assert_eq!(updated.created_at, original.created_at);
    assert!(updated.updated_at > original.updated_at);
}

#[tokio::test]
async fn test_update_errors() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("update_errors");
    let product = create_product(&app, product_body(&builder, "mint")).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/update_product/4242/",
            json!({ "name": "Ghost" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/update_product/{}/", product.id),
            json!({ "category": 77 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/update_product/{}/", product.id),
            json!({ "name": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_null_price_id_clears_it() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("clear_price_id");
    let mut body = product_body(&builder, "gum");
    body["price_id"] = json!("price_123");
    let original = create_product(&app, body).await;
    assert_eq!(original.price_id.as_deref(), Some("price_123"));

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/update_product/{}/", original.id),
            json!({ "price_id": null }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let updated: Product = json_body(response.into_body()).await;
    assert_eq!(updated.price_id, None);
    assert_eq!(updated.name, original.name);

    let response = app
        .oneshot(get(&format!("/individual_product/{}/", original.id)))
        .await
        .unwrap();
    let reloaded: Product = json_body(response.into_body()).await;
    assert_eq!(reloaded.price_id, None);
}

#[tokio::test]
async fn test_null_on_required_field_is_rejected() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("null_required");
    let original = create_product(&app, product_body(&builder, "fudge")).await;

    for field in ["name", "description", "price", "image_url", "category"] {
        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/update_product/{}/", original.id),
                json!({ field: null }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{field}");

        let error: Value = json_body(response.into_body()).await;
        assert!(error["details"][field].is_array(), "{field}");
    }

    let response = app
        .oneshot(get(&format!("/individual_product/{}/", original.id)))
        .await
        .unwrap();
    let unchanged: Product = json_body(response.into_body()).await;
    assert_eq!(unchanged.name, original.name);
    assert_eq!(unchanged.updated_at, original.updated_at);
}

#[tokio::test]
async fn test_duplicate_category_name_is_rejected() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("duplicate_category");
    let name = builder.category_name("dup");

    create_category(&app, &name).await;

    let response = app
        .oneshot(json_request("POST", "/add_category/", json!({ "name": name })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: Value = json_body(response.into_body()).await;
    assert!(error["details"]["name"].is_array());
}

#[tokio::test]
async fn test_category_name_length_limit() {
    let app = app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/add_category/",
            json!({ "name": "x".repeat(31) }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_category_name_is_trimmed() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("trimmed_category");

    let response = app
        .clone()
        .oneshot(json_request("POST", "/add_category/", json!({ "name": "   " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: Value = json_body(response.into_body()).await;
    assert!(error["details"]["name"].is_array());

    let name = builder.category_name("padded");
    let category = create_category(&app, &format!("  {name}  ")).await;
    assert_eq!(category.name, name);
}

#[tokio::test]
async fn test_delete_category_cascades_to_products() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("cascade");
    let category = create_category(&app, &builder.category_name("seasonal")).await;

    let mut ids = Vec::new();
    for suffix in ["egg", "bunny"] {
        let mut body = product_body(&builder, suffix);
        body["category"] = json!(category.id);
        ids.push(create_product(&app, body).await.id);
    }

    let response = app
        .clone()
        .oneshot(delete(&format!("/delete_category/{}/", category.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    for id in ids {
        let response = app
            .clone()
            .oneshot(get(&format!("/individual_product/{}/", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    let response = app.oneshot(get("/categories/")).await.unwrap();
    let categories: Vec<Category> = json_body(response.into_body()).await;
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, DEFAULT_CATEGORY_NAME);
}

#[tokio::test]
async fn test_default_category_cannot_be_deleted() {
    let app = app();

    let response = app
        .clone()
        .oneshot(delete(&format!("/delete_category/{}/", DEFAULT_CATEGORY_ID)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(delete("/delete_category/999/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

mod auth {
    use super::*;

    fn jwt() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new(SECRET).unwrap())
    }

    fn protected_app() -> Router {
        handlers::router_with_auth(CatalogService::new(InMemoryCatalogRepository::new()), jwt())
    }

    #[tokio::test]
    async fn test_mutations_require_token() {
        let app = protected_app();
        let builder = TestDataBuilder::from_test_name("auth_required");

        let requests = vec![
            json_request("POST", "/add_product/", product_body(&builder, "a")),
            json_request("POST", "/add_category/", json!({ "name": "Gum" })),
            json_request("PATCH", "/update_product/1/", json!({ "price": 1 })),
            delete("/delete_product/1/"),
            delete("/delete_category/2/"),
        ];

        for request in requests {
            let uri = request.uri().to_string();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);

            let error: Value = json_body(response.into_body()).await;
            assert_eq!(error["error"], "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected() {
        let app = protected_app();
        let other = JwtAuth::new(&JwtConfig::new("a-completely-different-signing-secret").unwrap());
        let token = other.issue_token("intruder", &[], ACCESS_TOKEN_TTL).unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/add_category/")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from(r#"{"name": "Gum"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_bearer_token_allows_mutation() {
        let app = protected_app();
        let builder = TestDataBuilder::from_test_name("auth_bearer");
        let token = jwt()
            .issue_token(&builder.subject(), &[], ACCESS_TOKEN_TTL)
            .unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/add_product/")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from(
                serde_json::to_string(&product_body(&builder, "authed")).unwrap(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_cookie_token_allows_mutation() {
        let app = protected_app();
        let token = jwt().issue_token("staff", &[], ACCESS_TOKEN_TTL).unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/add_category/")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, format!("access_token={}", token))
            .body(Body::from(r#"{"name": "Gum"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_reads_are_open() {
        let app = protected_app();

        for uri in ["/products/", "/categories/"] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }

        let response = app
            .clone()
            .oneshot(get("/individual_product/1/"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(json_request(
                "POST",
                "/get_multiple_products/",
                json!({ "ids": [1] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

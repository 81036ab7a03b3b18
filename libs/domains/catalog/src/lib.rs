//! Catalog Domain
//!
//! Products and the categories they belong to, exposed as a JSON API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, JWT on mutations, audit events
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Validation, category rules, bulk id parsing
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Store port (PostgreSQL + in-memory)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Domain types and request DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_catalog::{
//!     handlers,
//!     repository::InMemoryCatalogRepository,
//!     service::CatalogService,
//! };
//!
//! let service = CatalogService::new(InMemoryCatalogRepository::new());
//! let router = handlers::router(service);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{CatalogError, CatalogResult};
pub use handlers::ApiDoc;
pub use models::{
    BulkProductsRequest, Category, CreateCategory, CreateProduct, DEFAULT_CATEGORY_ID,
    DEFAULT_CATEGORY_NAME, MAX_BULK_IDS, Product, ProductFilter, SearchQuery, UpdateProduct,
};
pub use postgres::PgCatalogRepository;
pub use repository::{CatalogRepository, InMemoryCatalogRepository};
pub use service::CatalogService;

//! Observability utilities for the candy-shop catalog.
//!
//! - Prometheus metrics recorder and `/metrics` handler
//! - Axum middleware for request metrics
//! - Catalog operation metrics
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, CatalogMetrics};
//!
//! init_metrics()?;
//! CatalogMetrics::record_created("product");
//!
//! let app = Router::new().route("/metrics", get(metrics_handler));
//! ```

pub mod catalog;
pub mod middleware;

pub use catalog::CatalogMetrics;
pub use middleware::metrics_middleware;

pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global Prometheus recorder. Safe to call more than once; only
/// the first call installs.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;

        info!("Prometheus metrics recorder initialized");
        register_metric_descriptions();

        Ok(handle)
    })
}

pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::{describe_counter, describe_histogram};

    // HTTP metrics
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // Catalog metrics
    describe_counter!(
        "catalog_operations_total",
        "Catalog operations by operation and entity"
    );
    describe_histogram!(
        "catalog_search_results",
        "Number of products returned per search"
    );
    describe_histogram!(
        "catalog_listed_products",
        "Number of products returned per listing"
    );
    describe_counter!(
        "catalog_bulk_ids_dropped_total",
        "Bulk lookup ids discarded as invalid"
    );
}

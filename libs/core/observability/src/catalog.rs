//! Catalog-specific metrics.

use metrics::{counter, histogram};

/// Catalog metrics recorder
pub struct CatalogMetrics;

impl CatalogMetrics {
    fn operation(operation: &'static str, entity: &'static str) {
        counter!(
            "catalog_operations_total",
            "operation" => operation,
            "entity" => entity
        )
        .increment(1);
    }

    pub fn record_listed(entity: &'static str, count: usize, filtered: bool) {
        Self::operation("list", entity);
        histogram!(
            "catalog_listed_products",
            "entity" => entity,
            "filtered" => filtered.to_string()
        )
        .record(count as f64);

        tracing::debug!(entity, count, filtered, "Listed catalog entries");
    }

    pub fn record_fetched(entity: &'static str) {
        Self::operation("get", entity);
    }

    pub fn record_created(entity: &'static str) {
        Self::operation("create", entity);
    }

    pub fn record_updated(entity: &'static str) {
        Self::operation("update", entity);
    }

    pub fn record_deleted(entity: &'static str) {
        Self::operation("delete", entity);
    }

    pub fn record_search(results: usize) {
        Self::operation("search", "product");
        histogram!("catalog_search_results").record(results as f64);
    }

    /// `requested` raw entries, of which `valid` survived filtering and
    /// `found` matched stored products.
    pub fn record_bulk_lookup(requested: usize, valid: usize, found: usize) {
        Self::operation("bulk_get", "product");
        counter!("catalog_bulk_ids_dropped_total").increment(requested.saturating_sub(valid) as u64);

        tracing::debug!(requested, valid, found, "Bulk product lookup");
    }
}

use observability::CatalogMetrics;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    BulkProductsRequest, Category, CreateCategory, CreateProduct, DEFAULT_CATEGORY_ID,
    MAX_BULK_IDS, NewCategory, NewProduct, Product, ProductChanges, ProductFilter, SearchQuery,
    UpdateProduct,
};
use crate::repository::CatalogRepository;

/// Pull the usable ids out of a bulk lookup body.
///
/// The list must hold between 1 and [`MAX_BULK_IDS`] entries. Integers and
/// numeric strings that fit a positive `i32` are kept; everything else is
/// dropped. The result is ascending and free of duplicates.
pub fn parse_bulk_ids(raw: &[Value]) -> CatalogResult<Vec<i32>> {
    if raw.is_empty() {
        return Err(CatalogError::InvalidInput(
            "ids must be a non-empty list".to_string(),
        ));
    }

    if raw.len() > MAX_BULK_IDS {
        return Err(CatalogError::InvalidInput(format!(
            "at most {} ids can be requested at once",
            MAX_BULK_IDS
        )));
    }

    let ids: BTreeSet<i32> = raw
        .iter()
        .filter_map(|value| match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
        .filter_map(|id| i32::try_from(id).ok())
        .filter(|id| *id > 0)
        .collect();

    if ids.is_empty() {
        return Err(CatalogError::InvalidInput(
            "ids contains no valid product ids".to_string(),
        ));
    }

    Ok(ids.into_iter().collect())
}

/// Service layer for catalog business logic
pub struct CatalogService<R: CatalogRepository> {
    repository: Arc<R>,
}

impl<R: CatalogRepository> Clone for CatalogService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// List products, optionally restricted to the category with the given name
    pub async fn list_products(&self, filter: ProductFilter) -> CatalogResult<Vec<Product>> {
        let category_id = match filter.category_name() {
            Some(name) => {
                let category = self
                    .repository
                    .find_category_by_name(name)
                    .await?
                    .ok_or_else(|| CatalogError::UnknownCategoryName(name.to_string()))?;
                Some(category.id)
            }
            None => None,
        };

        let products = self.repository.list_products(category_id).await?;
        CatalogMetrics::record_listed("product", products.len(), category_id.is_some());
        Ok(products)
    }

    /// Get a product by ID
    pub async fn get_product(&self, id: i32) -> CatalogResult<Product> {
        let product = self
            .repository
            .get_product(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))?;

        CatalogMetrics::record_fetched("product");
        Ok(product)
    }

    /// Fetch several products at once; unknown ids are simply absent
    pub async fn get_products_by_ids(
        &self,
        request: BulkProductsRequest,
    ) -> CatalogResult<Vec<Product>> {
        let ids = parse_bulk_ids(&request.ids)?;
        let products = self.repository.get_products_by_ids(&ids).await?;

        CatalogMetrics::record_bulk_lookup(request.ids.len(), ids.len(), products.len());
        Ok(products)
    }

    /// Case-insensitive name search. No match, or an empty query, is NotFound.
    pub async fn search_products(&self, query: SearchQuery) -> CatalogResult<Vec<Product>> {
        let term = query.search_product;

        let products = if term.is_empty() {
            Vec::new()
        } else {
            self.repository.search_products(&term).await?
        };

        CatalogMetrics::record_search(products.len());

        if products.is_empty() {
            return Err(CatalogError::NoSearchResults(term));
        }

        Ok(products)
    }

    pub async fn create_product(&self, input: CreateProduct) -> CatalogResult<Product> {
        let input = NewProduct::try_from(input)?;
        self.ensure_category(input.category).await?;

        let product = self.repository.create_product(input).await?;
        CatalogMetrics::record_created("product");
        Ok(product)
    }

    /// Merge the supplied fields onto an existing product
    pub async fn update_product(&self, id: i32, input: UpdateProduct) -> CatalogResult<Product> {
        let changes = ProductChanges::try_from(input)?;

        if let Some(category) = changes.category {
            self.ensure_category(category).await?;
        }

        let product = self.repository.update_product(id, changes).await?;
        CatalogMetrics::record_updated("product");
        Ok(product)
    }

    pub async fn delete_product(&self, id: i32) -> CatalogResult<()> {
        if !self.repository.delete_product(id).await? {
            return Err(CatalogError::ProductNotFound(id));
        }

        CatalogMetrics::record_deleted("product");
        Ok(())
    }

    pub async fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        let categories = self.repository.list_categories().await?;
        CatalogMetrics::record_listed("category", categories.len(), false);
        Ok(categories)
    }

    pub async fn create_category(&self, input: CreateCategory) -> CatalogResult<Category> {
        let input = NewCategory::try_from(input)?;

        let category = self.repository.create_category(input).await?;
        CatalogMetrics::record_created("category");
        Ok(category)
    }

    /// Delete a category together with its products.
    ///
    /// The default category is the fallback for new products and cannot be removed.
    pub async fn delete_category(&self, id: i32) -> CatalogResult<()> {
        if id == DEFAULT_CATEGORY_ID {
            return Err(CatalogError::field(
                "category",
                "protected",
                "The default category cannot be deleted.",
            ));
        }

        if !self.repository.delete_category(id).await? {
            return Err(CatalogError::CategoryNotFound(id));
        }

        CatalogMetrics::record_deleted("category");
        Ok(())
    }

    async fn ensure_category(&self, id: i32) -> CatalogResult<()> {
        if self.repository.category_exists(id).await? {
            Ok(())
        } else {
            Err(CatalogError::unknown_category(id))
        }
    }
}

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    Category, DEFAULT_CATEGORY_ID, DEFAULT_CATEGORY_NAME, NewCategory, NewProduct, Product,
    ProductChanges,
};

/// Repository trait for catalog persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All categories, ascending id
    async fn list_categories(&self) -> CatalogResult<Vec<Category>>;

    /// Exact-name category lookup
    async fn find_category_by_name(&self, name: &str) -> CatalogResult<Option<Category>>;

    async fn category_exists(&self, id: i32) -> CatalogResult<bool>;

    /// Insert a category; a taken name is a validation error on `name`
    async fn create_category(&self, input: NewCategory) -> CatalogResult<Category>;

    /// Delete a category and every product in it
    async fn delete_category(&self, id: i32) -> CatalogResult<bool>;

    /// All products, ascending id, optionally limited to one category
    async fn list_products(&self, category_id: Option<i32>) -> CatalogResult<Vec<Product>>;

    async fn get_product(&self, id: i32) -> CatalogResult<Option<Product>>;

    /// Products whose id is in `ids`, ascending id
    async fn get_products_by_ids(&self, ids: &[i32]) -> CatalogResult<Vec<Product>>;

    /// Case-insensitive substring match on name, ascending id
    async fn search_products(&self, query: &str) -> CatalogResult<Vec<Product>>;

    async fn create_product(&self, input: NewProduct) -> CatalogResult<Product>;

    /// Merge `changes` onto the stored product
    async fn update_product(&self, id: i32, changes: ProductChanges) -> CatalogResult<Product>;

    async fn delete_product(&self, id: i32) -> CatalogResult<bool>;
}

#[derive(Debug)]
struct Store {
    categories: BTreeMap<i32, Category>,
    products: BTreeMap<i32, Product>,
    next_category_id: i32,
    next_product_id: i32,
}

impl Default for Store {
    fn default() -> Self {
        let mut categories = BTreeMap::new();
        categories.insert(
            DEFAULT_CATEGORY_ID,
            Category {
                id: DEFAULT_CATEGORY_ID,
                name: DEFAULT_CATEGORY_NAME.to_string(),
            },
        );

        Self {
            categories,
            products: BTreeMap::new(),
            next_category_id: DEFAULT_CATEGORY_ID + 1,
            next_product_id: 1,
        }
    }
}

/// In-memory implementation of CatalogRepository (for development/testing)
///
/// Starts with the default category. `BTreeMap` keeps iteration in id order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalogRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        let store = self.store.read().await;
        Ok(store.categories.values().cloned().collect())
    }

    async fn find_category_by_name(&self, name: &str) -> CatalogResult<Option<Category>> {
        let store = self.store.read().await;
        Ok(store.categories.values().find(|c| c.name == name).cloned())
    }

    async fn category_exists(&self, id: i32) -> CatalogResult<bool> {
        let store = self.store.read().await;
        Ok(store.categories.contains_key(&id))
    }

    async fn create_category(&self, input: NewCategory) -> CatalogResult<Category> {
        let mut store = self.store.write().await;

        if store.categories.values().any(|c| c.name == input.name) {
            return Err(CatalogError::duplicate_category_name());
        }

        let category = Category {
            id: store.next_category_id,
            name: input.name,
        };
        store.next_category_id += 1;
        store.categories.insert(category.id, category.clone());

        tracing::info!(category_id = category.id, "Created category");
        Ok(category)
    }

    async fn delete_category(&self, id: i32) -> CatalogResult<bool> {
        let mut store = self.store.write().await;

        if store.categories.remove(&id).is_none() {
            return Ok(false);
        }

        let before = store.products.len();
        store.products.retain(|_, p| p.category != id);
        let cascaded = before - store.products.len();

        tracing::info!(category_id = id, cascaded, "Deleted category");
        Ok(true)
    }

    async fn list_products(&self, category_id: Option<i32>) -> CatalogResult<Vec<Product>> {
        let store = self.store.read().await;
        Ok(store
            .products
            .values()
            .filter(|p| category_id.is_none_or(|id| p.category == id))
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: i32) -> CatalogResult<Option<Product>> {
        let store = self.store.read().await;
        Ok(store.products.get(&id).cloned())
    }

    async fn get_products_by_ids(&self, ids: &[i32]) -> CatalogResult<Vec<Product>> {
        let store = self.store.read().await;
        Ok(store
            .products
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn search_products(&self, query: &str) -> CatalogResult<Vec<Product>> {
        let needle = query.to_lowercase();
        let store = self.store.read().await;
        Ok(store
            .products
            .values()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn create_product(&self, input: NewProduct) -> CatalogResult<Product> {
        let mut store = self.store.write().await;

        if !store.categories.contains_key(&input.category) {
            return Err(CatalogError::unknown_category(input.category));
        }

        let now = Utc::now();
        let product = Product {
            id: store.next_product_id,
            name: input.name,
            description: input.description,
            price: input.price,
            price_id: input.price_id,
            image_url: input.image_url,
            category: input.category,
            created_at: now,
            updated_at: now,
        };
        store.next_product_id += 1;
        store.products.insert(product.id, product.clone());

        tracing::info!(product_id = product.id, "Created product");
        Ok(product)
    }

    async fn update_product(&self, id: i32, changes: ProductChanges) -> CatalogResult<Product> {
        let mut store = self.store.write().await;

        if let Some(category) = changes.category {
            if !store.categories.contains_key(&category) {
                return Err(CatalogError::unknown_category(category));
            }
        }

        let product = store
            .products
            .get_mut(&id)
            .ok_or(CatalogError::ProductNotFound(id))?;
        product.apply_update(changes);

        tracing::info!(product_id = id, "Updated product");
        Ok(product.clone())
    }

    async fn delete_product(&self, id: i32) -> CatalogResult<bool> {
        let mut store = self.store.write().await;

        if store.products.remove(&id).is_some() {
            tracing::info!(product_id = id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

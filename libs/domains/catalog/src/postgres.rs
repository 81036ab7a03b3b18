use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, SqlErr,
};

use crate::{
    entity::{category, product},
    error::{CatalogError, CatalogResult},
    models::{Category, NewCategory, NewProduct, Product, ProductChanges},
    repository::CatalogRepository,
};

/// PostgreSQL-backed catalog repository.
///
/// Cascade from categories to products is left to the foreign key declared by
/// the `products` migration.
#[derive(Clone)]
pub struct PgCatalogRepository {
    db: DatabaseConnection,
}

impl PgCatalogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Escape LIKE metacharacters so user input only ever matches literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn category_insert_error(err: DbErr) -> CatalogError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => CatalogError::duplicate_category_name(),
        _ => CatalogError::Database(err),
    }
}

fn product_write_error(err: DbErr, category_id: i32) -> CatalogError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            CatalogError::unknown_category(category_id)
        }
        _ => CatalogError::Database(err),
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        let models = category::Entity::find()
            .order_by_asc(category::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_category_by_name(&self, name: &str) -> CatalogResult<Option<Category>> {
        let model = category::Entity::find()
            .filter(category::Column::Name.eq(name))
            .one(&self.db)
            .await?;

        Ok(model.map(Into::into))
    }

    async fn category_exists(&self, id: i32) -> CatalogResult<bool> {
        Ok(category::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .is_some())
    }

    async fn create_category(&self, input: NewCategory) -> CatalogResult<Category> {
        if self.find_category_by_name(&input.name).await?.is_some() {
            return Err(CatalogError::duplicate_category_name());
        }

        let model = category::ActiveModel {
            name: sea_orm::ActiveValue::Set(input.name),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        // Concurrent inserts can still race past the lookup above.
        .map_err(category_insert_error)?;

        tracing::info!(category_id = model.id, "Created category");
        Ok(model.into())
    }

    async fn delete_category(&self, id: i32) -> CatalogResult<bool> {
        let result = category::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected > 0 {
            tracing::info!(category_id = id, "Deleted category");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn list_products(&self, category_id: Option<i32>) -> CatalogResult<Vec<Product>> {
        let mut query = product::Entity::find();

        if let Some(category_id) = category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }

        let models = query
            .order_by_asc(product::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn get_product(&self, id: i32) -> CatalogResult<Option<Product>> {
        let model = product::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn get_products_by_ids(&self, ids: &[i32]) -> CatalogResult<Vec<Product>> {
        let models = product::Entity::find()
            .filter(product::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(product::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn search_products(&self, query: &str) -> CatalogResult<Vec<Product>> {
        let models = product::Entity::find()
            .filter(Expr::cust_with_values(
                r#""products"."name" ILIKE $1"#,
                [like_pattern(query)],
            ))
            .order_by_asc(product::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn create_product(&self, input: NewProduct) -> CatalogResult<Product> {
        let category_id = input.category;
        let active_model: product::ActiveModel = input.into();

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| product_write_error(e, category_id))?;

        tracing::info!(product_id = model.id, category_id, "Created product");
        Ok(model.into())
    }

    async fn update_product(&self, id: i32, changes: ProductChanges) -> CatalogResult<Product> {
        let model = product::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))?;

        let mut product: Product = model.into();
        product.apply_update(changes);
        let category_id = product.category;

        let active_model: product::ActiveModel = product.into();
        let updated = active_model
            .update(&self.db)
            .await
            .map_err(|e| product_write_error(e, category_id))?;

        tracing::info!(product_id = id, "Updated product");
        Ok(updated.into())
    }

    async fn delete_product(&self, id: i32) -> CatalogResult<bool> {
        let result = product::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected > 0 {
            tracing::info!(product_id = id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_categories;
mod m20250301_000002_create_products;
mod m20250301_000003_seed_default_category;

/// Id of the category products fall back to when none is given.
pub const DEFAULT_CATEGORY_ID: i32 = 1;

/// Name of the default category row.
pub const DEFAULT_CATEGORY_NAME: &str = "Uncategorized";

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_categories::Migration),
            Box::new(m20250301_000002_create_products::Migration),
            Box::new(m20250301_000003_seed_default_category::Migration),
        ]
    }
}

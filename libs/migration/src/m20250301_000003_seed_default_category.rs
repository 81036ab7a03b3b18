use sea_orm_migration::prelude::*;

use crate::{DEFAULT_CATEGORY_ID, DEFAULT_CATEGORY_NAME};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(&format!(
            "INSERT INTO categories (id, name) VALUES ({}, '{}') ON CONFLICT DO NOTHING",
            DEFAULT_CATEGORY_ID, DEFAULT_CATEGORY_NAME
        ))
        .await?;

        // The explicit id above bypasses the serial sequence; move it past the seeded row.
        db.execute_unprepared(
            "SELECT setval(pg_get_serial_sequence('categories', 'id'), (SELECT MAX(id) FROM categories))",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(&format!(
                "DELETE FROM categories WHERE id = {}",
                DEFAULT_CATEGORY_ID
            ))
            .await?;

        Ok(())
    }
}

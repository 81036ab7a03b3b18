use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use super::PostgresConfig;
use crate::common::{RetryPolicy, retry_with_backoff};

/// Connect with explicit connection options.
pub async fn connect_with_options(options: ConnectOptions) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(options).await?;
    info!("Successfully connected to PostgreSQL database");
    Ok(db)
}

/// Connect using a [`PostgresConfig`].
pub async fn connect_from_config(config: PostgresConfig) -> Result<DatabaseConnection, DbErr> {
    connect_with_options(config.into_connect_options()).await
}

/// Connect from config, making up to `config.connect_attempts` tries with
/// doubling backoff.
///
/// The database container often comes up after the API in local compose setups,
/// so startup waits for it instead of failing on the first refused connection.
///
/// ```ignore
/// let config = PostgresConfig::from_env()?;
/// let db = connect_from_config_with_retry(config).await?;
/// ```
pub async fn connect_from_config_with_retry(
    config: PostgresConfig,
) -> Result<DatabaseConnection, DbErr> {
    let target = config.redacted_url();
    let policy = RetryPolicy::new(config.connect_attempts);
    let options = config.into_connect_options();

    retry_with_backoff(&target, policy, || connect_with_options(options.clone())).await
}

/// Apply all pending migrations of `M`.
///
/// ```ignore
/// run_migrations::<migration::Migrator>(&db, "candy_shop_api").await?;
/// ```
pub async fn run_migrations<M: MigratorTrait>(
    db: &DatabaseConnection,
    app_name: &str,
) -> Result<(), DbErr> {
    info!("Running {} database migrations...", app_name);
    M::up(db, None).await?;
    info!("Migrations completed successfully for {}", app_name);
    Ok(())
}

use crate::config::AppConfig;
use anyhow::Context;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::info;

/// Type alias for a database connection pool.
pub type DbPool = DatabaseConnection;

/// Establishes a connection pool from an AppConfig.
pub async fn create_db_pool(config: &AppConfig) -> anyhow::Result<DbPool> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(true);

    let pool = Database::connect(options)
        .await
        .with_context(|| format!("failed to connect to {}", config.database_url))?;

    info!("database connection established");
    Ok(pool)
}

/// Establishes a connection pool directly from a URL, with defaults.
pub async fn establish_connection(database_url: &str) -> anyhow::Result<DbPool> {
    create_db_pool(&AppConfig::new(database_url)).await
}

/// Applies all pending migrations.
pub async fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    crate::migrator::Migrator::up(pool, None)
        .await
        .context("failed to run migrations")?;
    info!("migrations applied");
    Ok(())
}

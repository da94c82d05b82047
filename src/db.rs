use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::{MySqlPool, mysql::MySqlPoolOptions};
use tracing::info;

pub async fn init_db(database_url: &str, run_migrations: bool) -> Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    if run_migrations {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
    }

    Ok(pool)
}

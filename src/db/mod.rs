mod error;
mod models;
mod repositories;

use anyhow::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

pub use error::DatabaseError;
pub use models::*;
pub use repositories::*;

/// Initialize the database connection pool
pub async fn init_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections.unwrap_or(10))
        .min_connections(config.min_connections.unwrap_or(1))
        .connect(&config.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

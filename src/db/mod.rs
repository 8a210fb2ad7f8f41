pub mod models;
pub mod repositories;
mod error;

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

pub use error::DatabaseError;
pub use models::*;
pub use repositories::{MemoryConfigSource, PgSchedulingRepository, SchedulingConfigSource};

/// Initialize the database connection pool.
///
/// The scheduling tables are owned by the hosted backend, so no migrations run here.
pub async fn init_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections.unwrap_or(10))
        .min_connections(config.min_connections.unwrap_or(1))
        .connect(&config.url)
        .await
        .context("Failed to connect to the scheduling database")?;

    Ok(pool)
}

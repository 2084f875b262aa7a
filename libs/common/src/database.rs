//! Direct PostgreSQL access to the provider's database
//!
//! Optional: when `DATABASE_URL` is set the web service reads and writes the
//! gallery tables through a connection pool instead of the data API.

use crate::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Pool, Postgres, postgres::PgPoolOptions};
use std::env;

/// Database configuration struct
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Create a DatabaseConfig from environment variables, or `None` when no
    /// database URL is configured
    ///
    /// # Environment Variables
    /// - `DATABASE_URL`: PostgreSQL connection URL
    /// - `DATABASE_MAX_CONNECTIONS`: Maximum number of connections (default: 5)
    pub fn from_env() -> Option<Self> {
        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Some(Self {
            database_url,
            max_connections,
        })
    }
}

/// Initialize a PostgreSQL connection pool
///
/// # Arguments
///
/// * `config` - Database configuration
///
/// # Returns
///
/// * `DatabaseResult<Pool<Postgres>>` - PostgreSQL connection pool or error
pub async fn init_pool(config: &DatabaseConfig) -> DatabaseResult<Pool<Postgres>> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(
            config
                .database_url
                .parse()
                .map_err(|e| DatabaseError::Configuration(format!("Invalid database URL: {}", e)))?,
        )
        .await
        .map_err(DatabaseError::Connection)
}

/// Check database connectivity
pub async fn health_check(pool: &PgPool) -> DatabaseResult<bool> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(DatabaseError::Query)?;

    Ok(true)
}

use anyhow::{Result, Context};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use log::{info, debug};

use crate::config::{is_sql_identifier, ConfigError, DatabaseConfig};

mod schema;
mod migrations;
mod store;
pub mod models;

pub use migrations::get_database_version;
pub use schema::table_columns;
pub use store::{SqliteUserStore, UserStore};

#[cfg(test)]
pub use store::MockUserStore;

#[cfg(test)]
mod tests;

/// Connection pool shared by the store
pub type DbPool = Pool<SqliteConnectionManager>;

/// Open the database, create missing tables and run migrations
pub fn initialize(config: &DatabaseConfig) -> Result<DbPool> {
    if !is_sql_identifier(&config.user_table) {
        return Err(ConfigError::InvalidTableName(config.user_table.clone()).into());
    }

    let db_path = &config.path;

    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
    }

    let manager = SqliteConnectionManager::file(db_path);

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .build(manager)
        .context("Failed to create database connection pool")?;

    let mut conn = pool.get().context("Failed to get a database connection")?;

    debug!("Preparing database at {}", db_path);
    schema::create_schema(&mut conn, &config.user_table).context("Failed to create database schema")?;
    migrations::run_migrations(&mut conn, &config.user_table).context("Failed to run database migrations")?;

    info!("Database initialized successfully");
    Ok(pool)
}

/// Build the store for the configured user table
pub fn user_store(pool: DbPool, config: &DatabaseConfig) -> Result<SqliteUserStore, ConfigError> {
    SqliteUserStore::new(pool, &config.user_table)
}

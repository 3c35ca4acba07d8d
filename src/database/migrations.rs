use anyhow::{Result, Context};
use log::{debug, info, warn};
use rusqlite::Connection;

use super::schema::table_columns;

// Database schema version
const CURRENT_VERSION: u32 = 1;

/// Run any necessary database migrations
pub fn run_migrations(conn: &mut Connection, user_table: &str) -> Result<()> {
    debug!("Checking database version");

    let version = get_database_version(conn)?;

    if version == CURRENT_VERSION {
        debug!("Database schema is up to date (version {})", version);
        // The version belongs to the file; a newly configured user table
        // still needs its password columns
        return ensure_password_columns(conn, user_table);
    }

    info!("Migrating database from version {} to {}", version, CURRENT_VERSION);

    let tx = conn.transaction().context("Failed to start transaction for migrations")?;

    for v in version..CURRENT_VERSION {
        let migration_fn = match v {
            0 => migrate_v0_to_v1,
            _ => {
                warn!("No migration function found for version {}", v);
                continue;
            }
        };

        debug!("Running migration from version {} to {}", v, v + 1);
        migration_fn(&tx, user_table).context(format!("Failed to migrate from version {} to {}", v, v + 1))?;
    }

    set_database_version(&tx, CURRENT_VERSION)?;

    tx.commit().context("Failed to commit migration transaction")?;

    info!("Database migration completed successfully to version {}", CURRENT_VERSION);
    Ok(())
}

/// Get the current database version
pub fn get_database_version(conn: &Connection) -> Result<u32> {
    let version_table_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='database_version')",
        [],
        |row| row.get(0),
    ).context("Failed to look up database_version table")?;

    if !version_table_exists {
        conn.execute(
            "CREATE TABLE database_version (version INTEGER NOT NULL)",
            [],
        ).context("Failed to create database_version table")?;

        conn.execute(
            "INSERT INTO database_version (version) VALUES (0)",
            [],
        ).context("Failed to initialize database version")?;

        return Ok(0);
    }

    let version: u32 = conn.query_row(
        "SELECT version FROM database_version",
        [],
        |row| row.get(0),
    ).context("Failed to get database version")?;

    Ok(version)
}

fn set_database_version(conn: &Connection, version: u32) -> Result<()> {
    conn.execute("UPDATE database_version SET version = ?1", [version])
        .context("Failed to update database version")?;
    Ok(())
}

fn migrate_v0_to_v1(conn: &Connection, user_table: &str) -> Result<()> {
    ensure_password_columns(conn, user_table)
}

/// Add the password change columns to the user table.
///
/// Columns the host already has are left alone.
fn ensure_password_columns(conn: &Connection, user_table: &str) -> Result<()> {
    let existing = table_columns(conn, user_table)?;

    let columns = [
        ("must_change_password", "INTEGER NOT NULL DEFAULT 0"),
        ("password_expiry_date", "INTEGER NOT NULL DEFAULT 0"),
    ];

    for (name, definition) in columns {
        if existing.iter().any(|c| c.eq_ignore_ascii_case(name)) {
            debug!("Column {}.{} already present", user_table, name);
            continue;
        }

        conn.execute(
            &format!("ALTER TABLE {} ADD COLUMN {} {}", user_table, name, definition),
            [],
        ).context(format!("Failed to add column {}.{}", user_table, name))?;
        debug!("Added column {}.{}", user_table, name);
    }

    Ok(())
}

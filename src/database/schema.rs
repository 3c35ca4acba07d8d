use anyhow::{Result, Context};
use log::debug;
use rusqlite::Connection;

/// Create the base tables when the host has not provided them.
///
/// The password change columns are added by the migrations so that a host
/// user table that already exists is handled the same way as a fresh one.
pub fn create_schema(conn: &mut Connection, user_table: &str) -> Result<()> {
    debug!("Creating database schema");

    let tx = conn.transaction().context("Failed to start transaction for schema creation")?;

    tx.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {} (
                uid INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL DEFAULT '',
                crdate INTEGER NOT NULL DEFAULT 0,
                tstamp INTEGER NOT NULL DEFAULT 0
            )",
            user_table
        ),
        [],
    ).context("Failed to create user table")?;

    // Append-only
    tx.execute(
        "CREATE TABLE IF NOT EXISTS password_audit_log (
            id TEXT PRIMARY KEY,
            event_type TEXT NOT NULL,
            user_uid INTEGER NOT NULL,
            details TEXT,
            timestamp TEXT NOT NULL
        )",
        [],
    ).context("Failed to create password_audit_log table")?;

    tx.execute(
        "CREATE INDEX IF NOT EXISTS idx_password_audit_log_user_uid ON password_audit_log(user_uid)",
        [],
    ).context("Failed to create index on password_audit_log.user_uid")?;

    tx.commit().context("Failed to commit schema creation transaction")?;

    debug!("Database schema created successfully");
    Ok(())
}

/// Names of the columns of a table
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))
        .context(format!("Failed to inspect table {}", table))?;

    let columns = stmt.query_map([], |row| row.get::<_, String>(1))
        .context(format!("Failed to read columns of {}", table))?
        .collect::<Result<Vec<_>, _>>()
        .context(format!("Failed to read columns of {}", table))?;

    Ok(columns)
}

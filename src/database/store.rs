use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::models::{AuditEntry, AuditEventType, PasswordUpdate, UserRecord};
use super::DbPool;
use crate::config::{is_sql_identifier, ConfigError};

/// Access to the frontend user records
#[cfg_attr(test, mockall::automock)]
pub trait UserStore {
    /// Load a user by primary key
    fn find_by_uid(&self, uid: i64) -> Result<Option<UserRecord>>;

    /// Write the new password columns; returns the number of affected rows
    fn update_password(&self, uid: i64, update: &PasswordUpdate) -> Result<usize>;

    /// Set the forced-change flag; returns the number of affected rows
    fn require_password_change(&self, uid: i64, tstamp: i64) -> Result<usize>;
}

/// SQLite backed user store
pub struct SqliteUserStore {
    pool: DbPool,
    user_table: String,
}

impl SqliteUserStore {
    pub fn new(pool: DbPool, user_table: &str) -> Result<Self, ConfigError> {
        if !is_sql_identifier(user_table) {
            return Err(ConfigError::InvalidTableName(user_table.to_string()));
        }

        Ok(Self {
            pool,
            user_table: user_table.to_string(),
        })
    }

    /// Audit entries of a user, oldest first
    pub fn audit_entries(&self, uid: i64) -> Result<Vec<AuditEntry>> {
        let conn = self.pool.get().context("Failed to get a database connection")?;

        let mut stmt = conn.prepare(
            "SELECT id, event_type, user_uid, details, timestamp
             FROM password_audit_log
             WHERE user_uid = ?1
             ORDER BY timestamp, rowid"
        ).context("Failed to prepare audit query")?;

        let rows = stmt.query_map(params![uid], |row| {
            let event_str: String = row.get(1)?;
            let event_type = AuditEventType::from_str(&event_str)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1,
                    rusqlite::types::Type::Text, e.into()))?;

            Ok(AuditEntry {
                id: row.get(0)?,
                event_type,
                user_uid: row.get(2)?,
                details: row.get(3)?,
                timestamp: row.get(4)?,
            })
        }).context("Failed to query audit log")?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry.context("Failed to read audit entry")?);
        }

        Ok(entries)
    }

    fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
        Ok(UserRecord {
            uid: row.get(0)?,
            username: row.get(1)?,
            password: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            must_change_password: row.get::<_, Option<i64>>(3)?.unwrap_or(0) != 0,
            password_expiry_date: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
            tstamp: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
        })
    }
}

/// Append an audit row stamped with the tstamp of the change it records
fn insert_audit_log(
    conn: &Connection,
    event_type: AuditEventType,
    uid: i64,
    details: &str,
    tstamp: i64,
) -> Result<()> {
    let timestamp = DateTime::<Utc>::from_timestamp(tstamp, 0).unwrap_or_default();

    conn.execute(
        "INSERT INTO password_audit_log (
            id, event_type, user_uid, details, timestamp
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5
        )",
        params![
            Uuid::new_v4().to_string(),
            event_type.as_str(),
            uid,
            details,
            timestamp.to_rfc3339(),
        ]
    ).context("Failed to create audit log entry")?;

    Ok(())
}

impl UserStore for SqliteUserStore {
    fn find_by_uid(&self, uid: i64) -> Result<Option<UserRecord>> {
        debug!("Loading user {}", uid);
        let conn = self.pool.get().context("Failed to get a database connection")?;

        conn.query_row(
            &format!(
                "SELECT uid, username, password, must_change_password, password_expiry_date, tstamp
                 FROM {}
                 WHERE uid = ?1",
                self.user_table
            ),
            params![uid],
            Self::map_user,
        ).optional().context(format!("Failed to load user {}", uid))
    }

    fn update_password(&self, uid: i64, update: &PasswordUpdate) -> Result<usize> {
        let mut conn = self.pool.get().context("Failed to get a database connection")?;
        let tx = conn.transaction().context("Failed to start a transaction")?;

        let affected = tx.execute(
            &format!(
                "UPDATE {} SET
                    password = ?1,
                    must_change_password = ?2,
                    password_expiry_date = ?3,
                    tstamp = ?4
                 WHERE uid = ?5",
                self.user_table
            ),
            params![
                update.password,
                update.must_change_password as i32,
                update.password_expiry_date,
                update.tstamp,
                uid,
            ],
        ).context(format!("Failed to update password of user {}", uid))?;

        if affected != 1 {
            warn!("Password update for user {} affected {} rows, rolling back", uid, affected);
            return Ok(affected);
        }

        let details = match update.password_expiry_date {
            0 => "Password changed, no expiry".to_string(),
            expiry => format!("Password changed, expires at {}", expiry),
        };
        insert_audit_log(&tx, AuditEventType::PasswordChanged, uid, &details, update.tstamp)?;

        tx.commit().context("Failed to commit password update")?;
        Ok(affected)
    }

    fn require_password_change(&self, uid: i64, tstamp: i64) -> Result<usize> {
        let mut conn = self.pool.get().context("Failed to get a database connection")?;
        let tx = conn.transaction().context("Failed to start a transaction")?;

        let affected = tx.execute(
            &format!(
                "UPDATE {} SET must_change_password = 1, tstamp = ?1 WHERE uid = ?2",
                self.user_table
            ),
            params![tstamp, uid],
        ).context(format!("Failed to flag user {} for a password change", uid))?;

        if affected != 1 {
            warn!("Forced password change for user {} affected {} rows, rolling back", uid, affected);
            return Ok(affected);
        }

        insert_audit_log(&tx, AuditEventType::PasswordChangeRequired, uid, "Password change required", tstamp)?;

        tx.commit().context("Failed to commit forced password change")?;
        Ok(affected)
    }
}

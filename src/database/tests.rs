use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tempfile::tempdir;

use crate::config::{ConfigError, DatabaseConfig};
use crate::database::{self, models::*, SqliteUserStore, UserStore};

/// Test fixture for database tests
fn setup_test_db() -> (tempfile::TempDir, DatabaseConfig, database::DbPool) {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db.db");

    let config = DatabaseConfig {
        path: db_path.to_str().unwrap().to_string(),
        max_connections: 2,
        user_table: "fe_users".to_string(),
    };

    let pool = database::initialize(&config).unwrap();

    (dir, config, pool)
}

fn insert_user(conn: &Connection, username: &str) -> i64 {
    conn.execute(
        "INSERT INTO fe_users (username, password, crdate, tstamp) VALUES (?1, ?2, ?3, ?3)",
        params![username, "$argon2id$initial", 1_600_000_000i64],
    ).unwrap();
    conn.last_insert_rowid()
}

#[test]
fn test_schema_creation() {
    let (_dir, _config, pool) = setup_test_db();
    let conn = pool.get().unwrap();

    for table in ["fe_users", "password_audit_log", "database_version"] {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?)",
            [table],
            |row| row.get(0),
        ).unwrap();

        assert!(exists, "Table '{}' should exist", table);
    }

    let columns = database::table_columns(&conn, "fe_users").unwrap();
    assert!(columns.contains(&"must_change_password".to_string()));
    assert!(columns.contains(&"password_expiry_date".to_string()));
    assert_eq!(database::get_database_version(&conn).unwrap(), 1);
}

#[test]
fn test_initialize_is_idempotent() {
    let (_dir, config, pool) = setup_test_db();
    let uid = insert_user(&pool.get().unwrap(), "jane");

    let pool = database::initialize(&config).unwrap();
    let store = SqliteUserStore::new(pool, "fe_users").unwrap();
    assert!(store.find_by_uid(uid).unwrap().is_some());
}

#[test]
fn test_migration_extends_existing_host_table() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("host.db");

    {
        let conn = Connection::open(&db_path).unwrap();
        conn.execute(
            "CREATE TABLE fe_users (
                uid INTEGER PRIMARY KEY,
                username TEXT NOT NULL,
                password TEXT NOT NULL,
                email TEXT,
                tstamp INTEGER NOT NULL DEFAULT 0
            )",
            [],
        ).unwrap();
        conn.execute(
            "INSERT INTO fe_users (uid, username, password, email, tstamp) VALUES (10, 'host', 'x', 'h@example.org', 5)",
            [],
        ).unwrap();
    }

    let config = DatabaseConfig {
        path: db_path.to_str().unwrap().to_string(),
        max_connections: 1,
        user_table: "fe_users".to_string(),
    };
    let pool = database::initialize(&config).unwrap();

    let columns = database::table_columns(&pool.get().unwrap(), "fe_users").unwrap();
    assert!(columns.contains(&"email".to_string()));
    assert!(columns.contains(&"must_change_password".to_string()));

    let store = SqliteUserStore::new(pool, "fe_users").unwrap();
    let user = store.find_by_uid(10).unwrap().unwrap();
    assert_eq!(user.username, "host");
    assert!(!user.must_change_password);
    assert_eq!(user.password_expiry_date, 0);
    assert_eq!(user.tstamp, 5);
}

#[test]
fn test_update_password_single_row_with_audit() {
    let (_dir, _config, pool) = setup_test_db();
    let conn = pool.get().unwrap();
    let uid = insert_user(&conn, "jane");
    let other = insert_user(&conn, "john");
    conn.execute("UPDATE fe_users SET must_change_password = 1", []).unwrap();
    drop(conn);

    let store = SqliteUserStore::new(pool, "fe_users").unwrap();
    let update = PasswordUpdate {
        password: "$argon2id$new".to_string(),
        must_change_password: false,
        password_expiry_date: 1_800_000_000,
        tstamp: 1_700_000_000,
    };

    assert_eq!(store.update_password(uid, &update).unwrap(), 1);

    let user = store.find_by_uid(uid).unwrap().unwrap();
    assert_eq!(user.password, "$argon2id$new");
    assert!(!user.must_change_password);
    assert_eq!(user.password_expiry_date, 1_800_000_000);
    assert_eq!(user.tstamp, 1_700_000_000);

    let untouched = store.find_by_uid(other).unwrap().unwrap();
    assert_eq!(untouched.password, "$argon2id$initial");
    assert!(untouched.must_change_password);

    let entries = store.audit_entries(uid).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_type, AuditEventType::PasswordChanged);
    assert_eq!(
        entries[0].timestamp,
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap().to_rfc3339()
    );
    assert!(store.audit_entries(other).unwrap().is_empty());
}

#[test]
fn test_update_password_unknown_user_writes_nothing() {
    let (_dir, _config, pool) = setup_test_db();
    let store = SqliteUserStore::new(pool, "fe_users").unwrap();

    let update = PasswordUpdate {
        password: "$argon2id$new".to_string(),
        must_change_password: false,
        password_expiry_date: 0,
        tstamp: 1_700_000_000,
    };

    assert_eq!(store.update_password(999, &update).unwrap(), 0);
    assert!(store.audit_entries(999).unwrap().is_empty());
}

#[test]
fn test_require_password_change() {
    let (_dir, _config, pool) = setup_test_db();
    let uid = insert_user(&pool.get().unwrap(), "jane");
    let store = SqliteUserStore::new(pool, "fe_users").unwrap();

    assert_eq!(store.require_password_change(uid, 1_700_000_123).unwrap(), 1);

    let user = store.find_by_uid(uid).unwrap().unwrap();
    assert!(user.must_change_password);
    assert_eq!(user.tstamp, 1_700_000_123);

    let entries = store.audit_entries(uid).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_type, AuditEventType::PasswordChangeRequired);
    assert_eq!(
        entries[0].timestamp,
        DateTime::<Utc>::from_timestamp(1_700_000_123, 0).unwrap().to_rfc3339()
    );

    assert_eq!(store.require_password_change(999, 1).unwrap(), 0);
}

#[test]
fn test_null_columns_read_as_defaults() {
    let (_dir, _config, pool) = setup_test_db();
    let conn = pool.get().unwrap();
    conn.execute_batch(
        "CREATE TABLE loose_users (
            uid INTEGER PRIMARY KEY,
            username TEXT NOT NULL,
            password TEXT,
            must_change_password INTEGER,
            password_expiry_date INTEGER,
            tstamp INTEGER
        );
        INSERT INTO loose_users (uid, username) VALUES (1, 'nulls');",
    ).unwrap();
    drop(conn);

    let store = SqliteUserStore::new(pool, "loose_users").unwrap();
    let user = store.find_by_uid(1).unwrap().unwrap();
    assert_eq!(user.password, "");
    assert!(!user.must_change_password);
    assert_eq!(user.password_expiry_date, 0);
    assert_eq!(user.tstamp, 0);
}

#[test]
fn test_store_rejects_bad_table_name() {
    let (_dir, _config, pool) = setup_test_db();
    assert!(SqliteUserStore::new(pool, "fe_users where 1=1").is_err());
}

#[test]
fn test_second_user_table_gets_password_columns() {
    let (_dir, config, _pool) = setup_test_db();

    let site_config = DatabaseConfig {
        user_table: "site_users".to_string(),
        ..config
    };
    let pool = database::initialize(&site_config).unwrap();
    let conn = pool.get().unwrap();
    assert_eq!(database::get_database_version(&conn).unwrap(), 1);

    let columns = database::table_columns(&conn, "site_users").unwrap();
    assert!(columns.contains(&"must_change_password".to_string()));
    assert!(columns.contains(&"password_expiry_date".to_string()));

    conn.execute(
        "INSERT INTO site_users (uid, username, password, crdate, tstamp) VALUES (1, 'site', 'x', 0, 0)",
        [],
    ).unwrap();
    drop(conn);

    let store = SqliteUserStore::new(pool, "site_users").unwrap();
    let user = store.find_by_uid(1).unwrap().unwrap();
    assert_eq!(user.username, "site");
    assert!(!user.must_change_password);
    assert_eq!(store.require_password_change(1, 1_700_000_000).unwrap(), 1);
}

#[test]
fn test_initialize_rejects_bad_table_name() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("rejected.db");

    let config = DatabaseConfig {
        path: db_path.to_str().unwrap().to_string(),
        max_connections: 1,
        user_table: "fe_users where 1=1".to_string(),
    };

    let err = database::initialize(&config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::InvalidTableName(name)) if name == "fe_users where 1=1"
    ));
    assert!(!db_path.exists());
}

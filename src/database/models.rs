use serde::{Deserialize, Serialize};

/// Frontend user row, limited to the columns the password change reads or writes
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct UserRecord {
    pub uid: i64,
    pub username: String,
    /// Stored password hash
    pub password: String,
    pub must_change_password: bool,
    /// Unix timestamp, `0` when no expiry applies
    pub password_expiry_date: i64,
    /// Last modification, unix timestamp
    pub tstamp: i64,
}

/// Column values written by a password change
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordUpdate {
    pub password: String,
    pub must_change_password: bool,
    pub password_expiry_date: i64,
    pub tstamp: i64,
}

/// Audit event type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum AuditEventType {
    PasswordChanged,
    PasswordChangeRequired,
}

impl AuditEventType {
    pub fn as_str(&self) -> &str {
        match self {
            AuditEventType::PasswordChanged => "password_changed",
            AuditEventType::PasswordChangeRequired => "password_change_required",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "password_changed" => Ok(AuditEventType::PasswordChanged),
            "password_change_required" => Ok(AuditEventType::PasswordChangeRequired),
            _ => Err(format!("Invalid audit event type: {}", s)),
        }
    }
}

/// Row of the password audit log
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AuditEntry {
    pub id: String,
    pub event_type: AuditEventType,
    pub user_uid: i64,
    pub details: Option<String>,
    pub timestamp: String,
}

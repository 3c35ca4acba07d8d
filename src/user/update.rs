use log::{debug, error, info};

use crate::clock::Clock;
use crate::config::ExpiryPolicy;
use crate::database::models::{PasswordUpdate, UserRecord};
use crate::database::UserStore;
use crate::security::PasswordHasher;

/// Password update error types
#[derive(Debug, thiserror::Error)]
pub enum PasswordUpdateError {
    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Password update for user {uid} affected {affected} rows, expected exactly one")]
    Persistence { uid: i64, affected: usize },
}

/// Store a new password for the user.
///
/// Hashes the password, clears the forced-change flag and sets the next
/// expiry date in a single update of the user's row. Returns the expiry that
/// was written. The update must hit exactly one row; nothing is retried.
pub fn update_password(
    store: &dyn UserStore,
    hasher: &dyn PasswordHasher,
    clock: &dyn Clock,
    expiry_policy: &dyn ExpiryPolicy,
    user: &UserRecord,
    new_password: &str,
) -> Result<i64, PasswordUpdateError> {
    debug!("Updating password of user {}", user.uid);

    let password = hasher.hash_password(new_password)
        .map_err(|e| PasswordUpdateError::Hashing(e.to_string()))?;

    let now = clock.now();
    let update = PasswordUpdate {
        password,
        must_change_password: false,
        password_expiry_date: expiry_policy.next_expiry(now),
        tstamp: now.timestamp(),
    };

    let affected = store.update_password(user.uid, &update)
        .map_err(|e| PasswordUpdateError::Store(format!("{:#}", e)))?;

    if affected != 1 {
        error!("Password update for user {} affected {} rows", user.uid, affected);
        return Err(PasswordUpdateError::Persistence { uid: user.uid, affected });
    }

    info!("Password updated for user {}", user.uid);
    Ok(update.password_expiry_date)
}

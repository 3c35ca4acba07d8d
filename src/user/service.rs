use log::{debug, info, warn};

use crate::clock::Clock;
use crate::config::{PasswordComplexityPolicy, PasswordExpiryConfig};
use crate::database::models::UserRecord;
use crate::database::UserStore;
use crate::security::PasswordHasher;
use crate::user::policy::must_change_password;
use crate::user::update::{update_password, PasswordUpdateError};
use crate::user::validation::{validate, ChangePasswordRequest, ValidationResult};

/// Service error types
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Update of user {uid} affected {affected} rows, expected exactly one")]
    Persistence { uid: i64, affected: usize },

    #[error(transparent)]
    Update(#[from] PasswordUpdateError),
}

/// Result of a password change submission
#[derive(Debug, Clone, PartialEq)]
pub enum ChangePasswordOutcome {
    /// Password stored; carries the expiry that was written
    Changed { password_expiry_date: i64 },
    /// Password refused; nothing was written
    Rejected(ValidationResult),
}

/// Entry point for the host's controller layer
pub struct ChangePasswordService {
    store: Box<dyn UserStore>,
    hasher: Box<dyn PasswordHasher>,
    clock: Box<dyn Clock>,
    complexity: PasswordComplexityPolicy,
    expiry: PasswordExpiryConfig,
}

impl ChangePasswordService {
    pub fn new(
        store: Box<dyn UserStore>,
        hasher: Box<dyn PasswordHasher>,
        clock: Box<dyn Clock>,
        complexity: PasswordComplexityPolicy,
        expiry: PasswordExpiryConfig,
    ) -> Self {
        Self {
            store,
            hasher,
            clock,
            complexity,
            expiry,
        }
    }

    pub fn find_user(&self, uid: i64) -> Result<UserRecord, ServiceError> {
        self.store.find_by_uid(uid)
            .map_err(|e| ServiceError::Store(format!("{:#}", e)))?
            .ok_or(ServiceError::UserNotFound(uid))
    }

    /// Whether the change form has to be shown to the user
    pub fn must_change_password(&self, uid: i64) -> Result<bool, ServiceError> {
        let user = self.find_user(uid)?;
        Ok(must_change_password(&user, self.clock.as_ref()))
    }

    /// Validate the submitted passwords and store the new one
    pub fn change_password(
        &self,
        uid: i64,
        request: &ChangePasswordRequest,
    ) -> Result<ChangePasswordOutcome, ServiceError> {
        let user = self.find_user(uid)?;

        let result = validate(request, &self.complexity);
        if !result.is_valid() {
            debug!("Password change for user {} rejected", uid);
            return Ok(ChangePasswordOutcome::Rejected(result));
        }

        let password_expiry_date = update_password(
            self.store.as_ref(),
            self.hasher.as_ref(),
            self.clock.as_ref(),
            &self.expiry,
            &user,
            &request.password1,
        )?;

        Ok(ChangePasswordOutcome::Changed { password_expiry_date })
    }

    /// Force the user to change the password on the next visit
    pub fn require_password_change(&self, uid: i64) -> Result<(), ServiceError> {
        let affected = self.store.require_password_change(uid, self.clock.timestamp())
            .map_err(|e| ServiceError::Store(format!("{:#}", e)))?;

        if affected != 1 {
            warn!("Forced password change for user {} affected {} rows", uid, affected);
            return Err(ServiceError::Persistence { uid, affected });
        }

        info!("User {} must change the password", uid);
        Ok(())
    }
}

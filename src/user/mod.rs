// Frontend user password change
// This module decides when a password change is due, validates the submitted
// password pair and writes the new password back to the user record.

mod policy;
mod validation;
mod update;
mod service;

pub use policy::{must_change_password, is_password_expired};
pub use validation::{validate, ChangePasswordRequest, ValidationFailure, ValidationResult};
pub use update::{update_password, PasswordUpdateError};
pub use service::{ChangePasswordOutcome, ChangePasswordService, ServiceError};

/// Error code for empty or mismatching password fields
pub const PASSWORD_FIELDS_ERROR_CODE: u32 = 1537701950;

/// Error code for a password below the minimum length
pub const MIN_LENGTH_ERROR_CODE: u32 = 1537898028;

/// Error code for a missing character class
pub const CHARACTER_CLASS_ERROR_CODE: u32 = 1537898029;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::PasswordComplexityPolicy;
use crate::localization::Translator;
use crate::user::{CHARACTER_CLASS_ERROR_CODE, MIN_LENGTH_ERROR_CODE, PASSWORD_FIELDS_ERROR_CODE};

lazy_static! {
    static ref UPPERCASE: Regex = Regex::new(r"[A-Z]").unwrap();
    static ref LOWERCASE: Regex = Regex::new(r"[a-z]").unwrap();
    static ref DIGIT: Regex = Regex::new(r"[0-9]").unwrap();
    static ref SPECIAL_CHAR: Regex = Regex::new(r"[^0-9a-zA-Z]").unwrap();
}

/// Submitted password pair
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub password1: String,
    pub password2: String,
}

impl ChangePasswordRequest {
    pub fn new(password1: impl Into<String>, password2: impl Into<String>) -> Self {
        Self {
            password1: password1.into(),
            password2: password2.into(),
        }
    }
}

/// A single reason a password was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    FieldsEmpty,
    PasswordsDoNotMatch,
    MinimumLength(usize),
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
    MissingSpecialChar,
}

impl ValidationFailure {
    /// Localization key of the message
    pub fn message_key(&self) -> &'static str {
        match self {
            ValidationFailure::FieldsEmpty => "passwordFieldsEmptyOrNotBothFilledOut",
            ValidationFailure::PasswordsDoNotMatch => "passwordsDoNotMatch",
            ValidationFailure::MinimumLength(_) => "passwordComplexity.failure.minLength",
            ValidationFailure::MissingUppercase => "passwordComplexity.failure.capitalCharCheck",
            ValidationFailure::MissingLowercase => "passwordComplexity.failure.lowerCaseCharCheck",
            ValidationFailure::MissingDigit => "passwordComplexity.failure.digitCheck",
            ValidationFailure::MissingSpecialChar => "passwordComplexity.failure.specialCharCheck",
        }
    }

    /// Numeric error code
    pub fn code(&self) -> u32 {
        match self {
            ValidationFailure::FieldsEmpty | ValidationFailure::PasswordsDoNotMatch => PASSWORD_FIELDS_ERROR_CODE,
            ValidationFailure::MinimumLength(_) => MIN_LENGTH_ERROR_CODE,
            _ => CHARACTER_CLASS_ERROR_CODE,
        }
    }

    /// Ordered message arguments
    pub fn arguments(&self) -> Vec<String> {
        match self {
            ValidationFailure::MinimumLength(len) => vec![len.to_string()],
            _ => Vec::new(),
        }
    }
}

/// Failures collected while validating, in the order they were found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<ValidationFailure>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationFailure] {
        &self.errors
    }

    pub fn message_keys(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.message_key()).collect()
    }

    /// Render every failure through the translator
    pub fn localized_messages(&self, translator: &dyn Translator) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| translator.translate(e.message_key(), &e.arguments()))
            .collect()
    }

    fn push(&mut self, failure: ValidationFailure) {
        self.errors.push(failure);
    }
}

/// Validate a submitted password pair against the complexity policy.
///
/// Empty fields and mismatching passwords end validation right away. All
/// other rules are evaluated and every failure is reported.
pub fn validate(request: &ChangePasswordRequest, policy: &PasswordComplexityPolicy) -> ValidationResult {
    debug!("Validating new password");

    let mut result = ValidationResult::default();

    if request.password1.is_empty() || request.password2.is_empty() {
        result.push(ValidationFailure::FieldsEmpty);
        return result;
    }

    if request.password1 != request.password2 {
        result.push(ValidationFailure::PasswordsDoNotMatch);
        return result;
    }

    let password = request.password1.as_str();

    if let Some(min_length) = policy.min_length {
        if password.len() < min_length {
            result.push(ValidationFailure::MinimumLength(min_length));
        }
    }

    let checks: [(bool, &Regex, ValidationFailure); 4] = [
        (policy.require_uppercase, &*UPPERCASE, ValidationFailure::MissingUppercase),
        (policy.require_lowercase, &*LOWERCASE, ValidationFailure::MissingLowercase),
        (policy.require_digit, &*DIGIT, ValidationFailure::MissingDigit),
        (policy.require_special_char, &*SPECIAL_CHAR, ValidationFailure::MissingSpecialChar),
    ];

    for (enabled, pattern, failure) in checks {
        if enabled && !pattern.is_match(password) {
            result.push(failure);
        }
    }

    if !result.is_valid() {
        debug!("New password rejected with {} error(s)", result.errors().len());
    }

    result
}

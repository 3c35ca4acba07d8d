use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use log::debug;

use crate::config::HashingConfig;

/// Startup errors for the hashing configuration
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum HashingConfigError {
    #[error("Unsupported password hash algorithm '{0}', only argon2id is allowed")]
    UnsupportedAlgorithm(String),

    #[error("Invalid Argon2 parameters: {0}")]
    InvalidParameters(String),
}

/// Hashing strategy used for new passwords
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher {
    /// Hash a password into a PHC string
    fn hash_password(&self, password: &str) -> Result<String>;

    /// Check a password against a stored PHC string
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Argon2id hasher
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    /// Build the hasher from configuration.
    ///
    /// Anything but `argon2id` is refused here so a misconfigured host fails
    /// at startup instead of storing weak hashes.
    pub fn from_config(config: &HashingConfig) -> Result<Self, HashingConfigError> {
        if !config.algorithm.eq_ignore_ascii_case("argon2id") {
            return Err(HashingConfigError::UnsupportedAlgorithm(config.algorithm.clone()));
        }

        let params = Params::new(
            config.memory_cost_kib,
            config.iterations,
            config.parallelism,
            None,
        ).map_err(|e| HashingConfigError::InvalidParameters(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self.argon2.hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("Failed to hash password: {}", e))?
            .to_string();

        debug!("Password hashed with Argon2id");
        Ok(password_hash)
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| anyhow!("Failed to parse password hash: {}", e))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }
}

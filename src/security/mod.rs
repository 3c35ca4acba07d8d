// Password hashing
// The only hasher is Argon2id; there is no fallback to weaker schemes.

pub mod password;

pub use password::{Argon2Hasher, HashingConfigError, PasswordHasher};

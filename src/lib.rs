//! Frontend user password change.
//!
//! Decides whether a frontend user has to change their password (forced flag
//! or elapsed expiry), validates a submitted password pair against the
//! configured complexity rules, and writes the new Argon2id hash back to the
//! user table together with the next expiry date.
//!
//! All collaborators are passed in explicitly: a [`database::UserStore`], a
//! [`security::password::PasswordHasher`], a [`clock::Clock`] and, for
//! rendering messages, a [`localization::Translator`].

pub mod clock;
pub mod config;
pub mod database;
pub mod localization;
pub mod security;
pub mod user;

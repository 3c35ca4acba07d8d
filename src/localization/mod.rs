// Message rendering
// The validator only produces message keys and arguments; a Translator turns
// them into text. MessageCatalog is the built-in English implementation.

use anyhow::{Context, Result};
use log::debug;
use std::collections::HashMap;
use std::path::Path;

/// Produces user-facing text for a message key
pub trait Translator {
    fn translate(&self, key: &str, arguments: &[String]) -> String;
}

/// Key to message pattern map.
///
/// Patterns use `%s` or `%d` placeholders, filled with the arguments in
/// order. Unknown keys render as the key itself.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    messages: HashMap<String, String>,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        let messages = [
            ("passwordFieldsEmptyOrNotBothFilledOut", "Please fill out both password fields."),
            ("passwordsDoNotMatch", "The given passwords do not match."),
            ("passwordComplexity.failure.minLength", "The password must be at least %s characters long."),
            ("passwordComplexity.failure.capitalCharCheck", "The password must contain at least one capital character."),
            ("passwordComplexity.failure.lowerCaseCharCheck", "The password must contain at least one lower case character."),
            ("passwordComplexity.failure.digitCheck", "The password must contain at least one digit."),
            ("passwordComplexity.failure.specialCharCheck", "The password must contain at least one special character."),
            ("passwordChanged", "Your password has been changed."),
            ("passwordChangeRequired", "You must change your password before you can continue."),
        ];

        Self {
            messages: messages
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl MessageCatalog {
    /// Empty catalog
    pub fn empty() -> Self {
        Self { messages: HashMap::new() }
    }

    /// Default catalog overlaid with a flat TOML table of `key = "pattern"`.
    ///
    /// Keys containing dots have to be quoted, e.g.
    /// `"passwordComplexity.failure.minLength" = "..."`.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read message catalog {}", path.display()))?;
        let overrides: HashMap<String, String> = toml::from_str(&contents)
            .context(format!("Failed to parse message catalog {}", path.display()))?;

        debug!("Loaded {} messages from {}", overrides.len(), path.display());

        let mut catalog = Self::default();
        catalog.messages.extend(overrides);
        Ok(catalog)
    }
}

impl Translator for MessageCatalog {
    fn translate(&self, key: &str, arguments: &[String]) -> String {
        match self.messages.get(key) {
            Some(pattern) => substitute(pattern, arguments),
            None => key.to_string(),
        }
    }
}

/// Replace `%s`/`%d` placeholders in order; `%%` is a literal percent sign
fn substitute(pattern: &str, arguments: &[String]) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut args = arguments.iter();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('s') | Some('d') => {
                chars.next();
                if let Some(arg) = args.next() {
                    out.push_str(arg);
                }
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }

    out
}

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::errors::DigfootError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("email regex is valid")
});

static PLUS_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+.*$").expect("plus-tag regex is valid")
});

/// A normalised (trimmed, lowercased) email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, DigfootError> {
        let normalised = raw.trim().to_lowercase();
        if !EMAIL_RE.is_match(&normalised) {
            return Err(DigfootError::InvalidEmail(raw.trim().to_string()));
        }
        Ok(Self(normalised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text before the `@`.
    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map(|(local, _)| local).unwrap_or(&self.0)
    }

    /// Text after the `@`.
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map(|(_, domain)| domain).unwrap_or("")
    }

    /// Local part with any `+tag` removed and dots stripped.
    pub fn base_username(&self) -> String {
        PLUS_TAG_RE.replace(self.local_part(), "").replace('.', "")
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

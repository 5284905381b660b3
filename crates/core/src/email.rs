//! Email address value object.
//!
//! Emails are validated and lowercased on construction, so every `Email` in
//! the system is syntactically plausible and `A@B.com` equals `a@b.com`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// A syntactically valid email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Parse, validate and lowercase an email address. Surrounding whitespace
    /// is ignored.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("email is required"));
        }
        if !EMAIL_RE.is_match(trimmed) {
            return Err(DomainError::validation("invalid email"));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before `@`, used as a non-sensitive display name.
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or_default()
    }
}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_address() {
        let email = Email::parse("  a@b.com ").unwrap();
        assert_eq!(email.as_str(), "a@b.com");
        assert_eq!(email.local_part(), "a");
    }

    #[test]
    fn case_is_folded() {
        let email = Email::parse("John.Doe@Example.COM").unwrap();
        assert_eq!(email.as_str(), "john.doe@example.com");
        assert_eq!(email, Email::parse("john.doe@example.com").unwrap());
        assert_eq!(email.local_part(), "john.doe");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for raw in ["", "   ", "plain", "a@b", "a b@c.com", "@b.com", "a@@b.com"] {
            assert!(Email::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn deserialization_validates() {
        let ok: Email = serde_json::from_str("\"john.doe@example.com\"").unwrap();
        assert_eq!(ok.local_part(), "john.doe");
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
    }
}

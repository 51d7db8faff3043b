//! Represents a validated email address.
//!
//! A type-safe wrapper that can only be constructed through validation, so
//! any instance is a properly formatted, normalized address. Validation is
//! delegated to the validator crate (HTML5 email rules).

use anyhow::{bail, Result};
use std::fmt;
use validator::ValidateEmail;

/// A validated email address, trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmailInput {
    email: String,
}

impl EmailInput {
    /// Creates a new `EmailInput` after validating the provided string.
    ///
    /// The address is trimmed, checked against a length cap and the HTML5
    /// email format, then lowercased so uniqueness comparisons are
    /// case-insensitive.
    pub fn new(email: &str) -> Result<Self> {
        let email_trimmed = email.trim();

        if email_trimmed.is_empty() {
            bail!("Email address cannot be empty");
        }

        if email_trimmed.len() > 254 {
            bail!("Email address exceeds maximum length of 254 characters");
        }

        if !email_trimmed.validate_email() {
            bail!("Invalid email format");
        }

        Ok(Self {
            email: email_trimmed.to_lowercase(),
        })
    }

    /// Returns a string slice of the validated email address
    pub fn as_str(&self) -> &str {
        &self.email
    }
}

impl fmt::Display for EmailInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.email)
    }
}

impl AsRef<str> for EmailInput {
    fn as_ref(&self) -> &str {
        &self.email
    }
}

//! Represents a validated mobile number.
//!
//! The platform stores mobile numbers as ten-digit strings; separators and
//! surrounding whitespace are stripped before validation so that
//! "079 555 01 23" and "0795550123" normalize to the same value.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static MOBILE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{10}$").expect("Failed to compile mobile regex"));

/// A mobile number that is guaranteed to be exactly ten digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MobileInput {
    mobile: String,
}

impl MobileInput {
    /// Validates and normalizes a raw mobile number.
    pub fn new(mobile: &str) -> Result<Self> {
        let cleaned: String = mobile
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '.')
            .collect();

        if cleaned.is_empty() {
            bail!("Mobile number cannot be empty");
        }

        if !MOBILE_REGEX.is_match(&cleaned) {
            bail!("Mobile number must be 10 digits");
        }

        Ok(Self { mobile: cleaned })
    }

    pub fn as_str(&self) -> &str {
        &self.mobile
    }
}

impl fmt::Display for MobileInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mobile)
    }
}

impl AsRef<str> for MobileInput {
    fn as_ref(&self) -> &str {
        &self.mobile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_mobiles() {
        let valid = vec!["0795550123", "079 555 01 23", "079-555-0123", "  0795550123  "];

        for mobile in valid {
            let result = MobileInput::new(mobile);
            assert!(result.is_ok(), "Should accept valid mobile: {}", mobile);
        }
    }

    #[test]
    fn test_invalid_mobiles() {
        let invalid = vec![
            "",            // Empty
            "   ",         // Only whitespace
            "12345",       // Too short
            "12345678901", // Too long
            "07955501ab",  // Non-digits
            "+4179555012", // Plus sign not accepted
        ];

        for mobile in invalid {
            let result = MobileInput::new(mobile);
            assert!(result.is_err(), "Should reject invalid mobile: {}", mobile);
        }
    }

    #[test]
    fn test_normalization() {
        let mobile = MobileInput::new("079 555.01-23").unwrap();
        assert_eq!(mobile.as_str(), "0795550123");
    }
}

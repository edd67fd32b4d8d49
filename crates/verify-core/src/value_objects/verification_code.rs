//! Verification code - the out-of-band token a user places in their external profile

use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A code of the form `VERIFY-XXXXXX` (six uppercase base36 characters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Literal prefix every code carries
    pub const PREFIX: &'static str = "VERIFY-";

    /// Number of random characters after the prefix
    pub const SUFFIX_LEN: usize = 6;

    const CHARSET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Generate a fresh code from the operating system's CSPRNG
    pub fn generate() -> Self {
        let suffix: String = (0..Self::SUFFIX_LEN)
            .map(|_| Self::CHARSET[OsRng.gen_range(0..Self::CHARSET.len())] as char)
            .collect();
        Self(format!("{}{suffix}", Self::PREFIX))
    }

    /// Parse a stored or user-supplied code, enforcing the exact format
    pub fn parse(s: &str) -> Result<Self, CodeParseError> {
        if Self::is_valid_format(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(CodeParseError::InvalidFormat(s.to_string()))
        }
    }

    /// Check whether a string has the `VERIFY-` + 6 uppercase alphanumerics shape
    pub fn is_valid_format(s: &str) -> bool {
        s.strip_prefix(Self::PREFIX).is_some_and(|suffix| {
            suffix.len() == Self::SUFFIX_LEN
                && suffix
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        })
    }

    /// The code as it should be shown to the user
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `text` contains this code once whitespace and case are ignored
    pub fn is_contained_in(&self, text: &str) -> bool {
        normalize_for_match(text).contains(&normalize_for_match(&self.0))
    }
}

/// Strip every Unicode whitespace character and lower-case the rest
///
/// Users often paste the code with stray spaces or line breaks, and profile
/// renderers may change case.
pub fn normalize_for_match(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Error when parsing a verification code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeParseError {
    #[error("invalid verification code: {0}")]
    InvalidFormat(String),
}

impl TryFrom<String> for VerificationCode {
    type Error = CodeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_valid_format(&value) {
            Ok(Self(value))
        } else {
            Err(CodeParseError::InvalidFormat(value))
        }
    }
}

impl From<VerificationCode> for String {
    fn from(code: VerificationCode) -> Self {
        code.0
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VerificationCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

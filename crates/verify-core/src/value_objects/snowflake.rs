//! Snowflake - the chat platform's numeric ID for users, servers, roles and channels
//!
//! The platform issues unsigned 64-bit IDs and sends them as JSON strings.
//! Every real ID fits in 63 bits, so they are kept as `i64` to map directly
//! onto Postgres `BIGINT`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Platform-issued ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Snowflake(i64);

impl Snowflake {
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw value, as bound into SQL
    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// Parse the decimal form the platform uses on the wire
    pub fn parse(s: &str) -> Result<Self, SnowflakeParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SnowflakeParseError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SnowflakeParseError::NotNumeric);
        }
        s.parse::<i64>()
            .map(Self)
            .map_err(|_| SnowflakeParseError::OutOfRange)
    }
}

/// Why a string is not a snowflake
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SnowflakeParseError {
    #[error("snowflake is empty")]
    Empty,
    #[error("snowflake must be decimal digits")]
    NotNumeric,
    #[error("snowflake does not fit in 63 bits")]
    OutOfRange,
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Snowflake {
    type Err = SnowflakeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<i64> for Snowflake {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<Snowflake> for i64 {
    fn from(id: Snowflake) -> Self {
        id.0
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Accepts `"123"` as sent by the platform, and a bare `123` from hand-written config
impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Number(i64),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
            Wire::Number(n) => Ok(Self(n)),
        }
    }
}

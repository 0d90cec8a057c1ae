//! The ViewLink agent identity — a fixed-length numeric value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of digits in a ViewLink agent identity.
pub const IDENTITY_LEN: usize = 9;

/// Error returned when a candidate identity fails validation.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid agent identity '{candidate}': must be exactly {} ASCII digits", IDENTITY_LEN)]
pub struct InvalidIdentity {
    pub candidate: String,
}

/// A validated ViewLink agent identity.
///
/// The agent assigns each install a nine-digit numeric ID. The newtype
/// guarantees the invariant at construction so downstream code never
/// re-checks the format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentIdentity(String);

impl AgentIdentity {
    /// Parse a candidate string, accepting surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidIdentity`] unless the trimmed input is exactly
    /// [`IDENTITY_LEN`] ASCII digits.
    pub fn parse(candidate: &str) -> Result<Self, InvalidIdentity> {
        let trimmed = candidate.trim();
        if trimmed.len() == IDENTITY_LEN && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(InvalidIdentity {
                candidate: candidate.to_owned(),
            })
        }
    }

    /// The identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AgentIdentity {
    type Err = InvalidIdentity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AgentIdentity {
    type Error = InvalidIdentity;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AgentIdentity> for String {
    fn from(id: AgentIdentity) -> Self {
        id.0
    }
}

//! ZIP token encoding and ZIP code validation
//!
//! Referring ZIPs are persisted as a single `|`-joined string. Tokens can be
//! full 5-digit ZIPs or 4/3-digit prefixes; the mixed granularity is kept
//! as-is in both directions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ZipRouteError;

/// Separator between tokens in the stored form
pub const ZIP_DELIMITER: &str = "|";

/// Decode a stored ZIP list. Empty or absent input gives an empty list.
pub fn decode(stored: Option<&str>) -> Vec<String> {
    stored
        .unwrap_or_default()
        .split(ZIP_DELIMITER)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Encode tokens into the stored form, preserving order
pub fn encode<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(ZIP_DELIMITER)
}

/// Resolution tier, ordered from most to least specific
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Zip5,
    Zip4,
    Zip3,
}

impl MatchType {
    /// Tiers in the order they are tried
    pub const FALLBACK_ORDER: [MatchType; 3] = [MatchType::Zip5, MatchType::Zip4, MatchType::Zip3];

    /// Number of leading digits a token of this tier carries
    pub fn digits(self) -> usize {
        match self {
            MatchType::Zip5 => 5,
            MatchType::Zip4 => 4,
            MatchType::Zip3 => 3,
        }
    }

    /// Tier of a stored token, or `None` if it is not a 3/4/5 digit string
    pub fn of_token(token: &str) -> Option<MatchType> {
        if !token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match token.len() {
            5 => Some(MatchType::Zip5),
            4 => Some(MatchType::Zip4),
            3 => Some(MatchType::Zip3),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::Zip5 => "zip5",
            MatchType::Zip4 => "zip4",
            MatchType::Zip3 => "zip3",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated 5-digit ZIP code
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Zip5(String);

impl Zip5 {
    pub fn parse(input: &str) -> Result<Self, ZipRouteError> {
        if input.len() == 5 && input.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Zip5(input.to_string()))
        } else {
            Err(ZipRouteError::InvalidInput(input.to_string()))
        }
    }

    /// Leading digits used as the lookup key for `tier`
    pub fn prefix(&self, tier: MatchType) -> &str {
        &self.0[..tier.digits()]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Zip5 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! City key normalization
//!
//! Every advisory is stored under the trimmed, lower-cased city name. Raw names
//! coming from users, the store or city discovery all pass through here first.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AdvisoryError, Result};

const MIN_CITY_LEN: usize = 3;

/// Validated, canonical lookup key for a city
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityKey(String);

impl CityKey {
    /// Validate a raw city name and turn it into a key
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(AdvisoryError::validation("City is required"));
        }

        let trimmed = raw.trim();

        if trimmed.chars().count() < MIN_CITY_LEN {
            return Err(AdvisoryError::validation("City name too short"));
        }

        if !trimmed.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') {
            return Err(AdvisoryError::validation(
                "City must contain only letters and spaces",
            ));
        }

        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CityKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// String form of [`CityKey::parse`]
pub fn normalize(raw: &str) -> Result<String> {
    CityKey::parse(raw).map(CityKey::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("London", "london")]
    #[case("  New York  ", "new york")]
    #[case("PARIS", "paris")]
    #[case("Rio de Janeiro", "rio de janeiro")]
    #[case("abc", "abc")]
    fn test_normalize_valid(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("", "City is required")]
    #[case("   ", "City is required")]
    #[case("ab", "City name too short")]
    #[case("  ab  ", "City name too short")]
    #[case("Saint-Denis", "City must contain only letters and spaces")]
    #[case("Area 51", "City must contain only letters and spaces")]
    #[case("São Paulo", "City must contain only letters and spaces")]
    fn test_normalize_rejects(#[case] raw: &str, #[case] message: &str) {
        let err = normalize(raw).unwrap_err();
        match err {
            AdvisoryError::Validation { message: actual } => assert_eq!(actual, message),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[rstest]
    #[case("London")]
    #[case("  Buenos Aires ")]
    #[case("kyoto")]
    fn test_normalize_is_idempotent(#[case] raw: &str) {
        let once = normalize(raw).unwrap();
        let twice = normalize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_city_key_display() {
        let key = CityKey::parse(" Berlin ").unwrap();
        assert_eq!(key.to_string(), "berlin");
        assert_eq!(key.as_str(), "berlin");
    }
}

//! Country facts attached to an advisory

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Point-in-time read of country facts
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CountrySnapshot {
    /// Common country name (e.g. "France")
    pub name: String,
    /// Primary currency code, first one listed upstream
    pub currency: Option<String>,
    /// First listed capital
    pub capital: Option<String>,
    pub timezones: Vec<String>,
    /// Language code to language name
    pub languages: BTreeMap<String, String>,
    pub flag_url: String,
    pub population: u64,
    pub region: String,
}

impl CountrySnapshot {
    /// Case-insensitive match against a free-text country name
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

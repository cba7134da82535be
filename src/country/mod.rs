//! Country lookup
//!
//! Resolves country facts either by ISO code (the sync pipeline, using the code
//! the weather service reports) or by free-text name (country-scoped refresh).

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::models::CountrySnapshot;

pub mod rest_countries;

pub use rest_countries::RestCountriesClient;

/// Country facts as reported upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryReport {
    /// ISO 3166-1 alpha-2 code, when the upstream provides one
    pub code: Option<String>,
    pub name: String,
    pub capitals: Vec<String>,
    pub timezones: Vec<String>,
    pub languages: BTreeMap<String, String>,
    pub flag_url: String,
    /// Currency codes in upstream order
    pub currencies: Vec<String>,
    pub population: u64,
    pub region: String,
}

impl CountryReport {
    #[must_use]
    pub fn snapshot(&self) -> CountrySnapshot {
        CountrySnapshot {
            name: self.name.clone(),
            currency: self.currencies.first().cloned(),
            capital: self.capitals.first().cloned(),
            timezones: self.timezones.clone(),
            languages: self.languages.clone(),
            flag_url: self.flag_url.clone(),
            population: self.population,
            region: self.region.clone(),
        }
    }

    /// Usable ISO code; blank codes count as missing
    #[must_use]
    pub fn iso_code(&self) -> Option<&str> {
        self.code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

/// Source of country facts
#[async_trait]
pub trait CountryLookup: Send + Sync {
    async fn by_code(&self, code: &str) -> Result<CountryReport>;

    async fn by_name(&self, name: &str) -> Result<CountryReport>;
}

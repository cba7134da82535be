//! REST Countries v3.1 client

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::{CountryLookup, CountryReport};
use crate::config::CountryConfig;
use crate::http;
use crate::{AdvisoryError, Result};

const SERVICE: &str = "REST Countries";

pub struct RestCountriesClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl RestCountriesClient {
    pub fn new(config: &CountryConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout_seconds, config.max_retries)?,
            base_url: config.base_url.clone(),
        })
    }

    async fn first_match(&self, path: &str, params: &[(&str, &str)]) -> Result<CountryReport> {
        let url = http::endpoint(&self.base_url, path, params)?;
        let countries: Vec<CountryResponse> = http::get_json(&self.client, SERVICE, url).await?;

        countries
            .into_iter()
            .next()
            .map(CountryResponse::into_report)
            .ok_or_else(|| AdvisoryError::upstream(format!("{SERVICE} returned no countries")))
    }
}

#[async_trait]
impl CountryLookup for RestCountriesClient {
    #[instrument(skip(self))]
    async fn by_code(&self, code: &str) -> Result<CountryReport> {
        debug!("Looking up country by code: {}", code);
        let path = format!("/v3.1/alpha/{}", urlencoding::encode(code.trim()));
        self.first_match(&path, &[]).await
    }

    #[instrument(skip(self))]
    async fn by_name(&self, name: &str) -> Result<CountryReport> {
        debug!("Looking up country by name: {}", name);
        let path = format!("/v3.1/name/{}", urlencoding::encode(name.trim()));
        self.first_match(&path, &[("fullText", "true")]).await
    }
}

#[derive(Debug, Deserialize)]
struct CountryResponse {
    name: NameData,
    cca2: Option<String>,
    #[serde(default)]
    capital: Vec<String>,
    #[serde(default)]
    timezones: Vec<String>,
    #[serde(default)]
    languages: BTreeMap<String, String>,
    flags: Option<FlagsData>,
    /// Keyed by currency code; upstream order is kept
    #[serde(default)]
    currencies: Map<String, Value>,
    #[serde(default)]
    population: u64,
    #[serde(default)]
    region: String,
}

#[derive(Debug, Deserialize)]
struct NameData {
    common: String,
}

#[derive(Debug, Deserialize)]
struct FlagsData {
    png: Option<String>,
}

impl CountryResponse {
    fn into_report(self) -> CountryReport {
        CountryReport {
            code: self.cca2,
            name: self.name.common,
            capitals: self.capital,
            timezones: self.timezones,
            languages: self.languages,
            flag_url: self.flags.and_then(|flags| flags.png).unwrap_or_default(),
            currencies: self.currencies.into_iter().map(|(code, _)| code).collect(),
            population: self.population,
            region: self.region,
        }
    }
}

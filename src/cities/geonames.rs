//! GeoNames `searchJSON` client

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::CityDiscovery;
use crate::Result;
use crate::config::CitiesConfig;
use crate::http;

const SERVICE: &str = "GeoNames";

pub struct GeoNamesClient {
    client: ClientWithMiddleware,
    base_url: String,
    username: Option<String>,
}

impl GeoNamesClient {
    pub fn new(config: &CitiesConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout_seconds, config.max_retries)?,
            base_url: config.base_url.clone(),
            username: config
                .username
                .clone()
                .filter(|username| !username.trim().is_empty()),
        })
    }

    async fn search(
        &self,
        username: &str,
        country_code: &str,
        limit: usize,
    ) -> Result<SearchResponse> {
        let max_rows = limit.to_string();
        let url = http::endpoint(
            &self.base_url,
            "/searchJSON",
            &[
                ("country", country_code),
                ("featureClass", "P"),
                ("orderby", "population"),
                ("maxRows", max_rows.as_str()),
                ("username", username),
            ],
        )?;

        http::get_json(&self.client, SERVICE, url).await
    }
}

#[async_trait]
impl CityDiscovery for GeoNamesClient {
    #[instrument(skip(self))]
    async fn top_cities(&self, country_code: &str, limit: usize) -> Vec<String> {
        let Some(username) = &self.username else {
            warn!("GeoNames username missing, returning empty city list");
            return Vec::new();
        };

        match self.search(username, country_code, limit).await {
            Ok(response) => {
                let cities = response.city_names();
                info!("GeoNames returned {} cities for {}", cities.len(), country_code);
                cities
            }
            Err(e) => {
                warn!("GeoNames call failed for {}: {}", country_code, e);
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    geonames: Vec<GeoName>,
    /// GeoNames reports errors (bad username, quota) with HTTP 200 and this field
    status: Option<StatusData>,
}

#[derive(Debug, Deserialize)]
struct GeoName {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    message: Option<String>,
}

impl SearchResponse {
    fn city_names(self) -> Vec<String> {
        if let Some(status) = self.status {
            warn!(
                "GeoNames reported an error: {}",
                status.message.unwrap_or_default()
            );
            return Vec::new();
        }

        self.geonames
            .into_iter()
            .filter_map(|geoname| geoname.name)
            .filter(|name| !name.trim().is_empty())
            .collect()
    }
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::advisory_engine;
use crate::models::{AuditType, CountrySnapshot, SyncedAdvisory, TravelAdvisory, WeatherSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Envelope around every API payload; absent fields are omitted
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            audit: None,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_audit(data: T, audit: AuditType) -> Self {
        Self {
            audit: Some(audit),
            ..Self::success(data)
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            audit: None,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWeather {
    pub description: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub sunrise: String,
    pub sunset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCountry {
    pub name: String,
    pub currency: Option<String>,
    pub capital: Option<String>,
    pub timezones: Vec<String>,
    pub languages: BTreeMap<String, String>,
    pub flag_url: String,
    pub population: u64,
    pub region: String,
}

/// A stored advisory plus the sentence derived from its weather
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryResponse {
    pub city: String,
    pub weather: ApiWeather,
    pub country: ApiCountry,
    pub synced_at: DateTime<Utc>,
    pub advisory: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryWithAudit {
    pub advisory: AdvisoryResponse,
    pub audit: AuditType,
}

impl From<&WeatherSnapshot> for ApiWeather {
    fn from(weather: &WeatherSnapshot) -> Self {
        Self {
            description: weather.description.clone(),
            temperature: weather.temperature,
            feels_like: weather.feels_like,
            humidity: weather.humidity,
            wind_speed: weather.wind_speed,
            sunrise: weather.sunrise.clone(),
            sunset: weather.sunset.clone(),
        }
    }
}

impl From<&CountrySnapshot> for ApiCountry {
    fn from(country: &CountrySnapshot) -> Self {
        Self {
            name: country.name.clone(),
            currency: country.currency.clone(),
            capital: country.capital.clone(),
            timezones: country.timezones.clone(),
            languages: country.languages.clone(),
            flag_url: country.flag_url.clone(),
            population: country.population,
            region: country.region.clone(),
        }
    }
}

impl From<&TravelAdvisory> for AdvisoryResponse {
    fn from(advisory: &TravelAdvisory) -> Self {
        Self {
            city: advisory.city.clone(),
            weather: ApiWeather::from(&advisory.weather),
            country: ApiCountry::from(&advisory.country),
            synced_at: advisory.synced_at,
            advisory: advisory_engine::build(&advisory.weather),
        }
    }
}

impl From<&SyncedAdvisory> for AdvisoryWithAudit {
    fn from(synced: &SyncedAdvisory) -> Self {
        Self {
            advisory: AdvisoryResponse::from(&synced.advisory),
            audit: synced.audit,
        }
    }
}

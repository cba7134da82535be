//! OpenWeather current-weather client

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{WeatherLookup, WeatherReport};
use crate::config::WeatherConfig;
use crate::http;
use crate::{AdvisoryError, Result};

const SERVICE: &str = "OpenWeather";

/// Weather client for the OpenWeather `data/2.5/weather` endpoint
pub struct OpenWeatherClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout_seconds, config.max_retries)?,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl WeatherLookup for OpenWeatherClient {
    #[instrument(skip(self))]
    async fn fetch(&self, city: &str) -> Result<WeatherReport> {
        let mut params = vec![("q", city), ("units", "metric")];
        if let Some(api_key) = &self.api_key {
            params.push(("APPID", api_key.as_str()));
        }

        let url = http::endpoint(&self.base_url, "/data/2.5/weather", &params)?;
        debug!("Calling {} for city: {}", SERVICE, city);

        let response: CurrentWeatherResponse = http::get_json(&self.client, SERVICE, url).await?;
        let report = response.into_report()?;

        info!(
            "{} response - city: {}, temp: {}°C, humidity: {}%",
            SERVICE, city, report.temperature, report.humidity
        );
        Ok(report)
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    main: MainData,
    #[serde(default)]
    weather: Vec<Condition>,
    sys: SysData,
    wind: WindData,
    /// Shift in seconds from UTC
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct MainData {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct SysData {
    sunrise: i64,
    sunset: i64,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WindData {
    speed: f64,
}

impl CurrentWeatherResponse {
    fn into_report(self) -> Result<WeatherReport> {
        let description = self
            .weather
            .into_iter()
            .next()
            .map(|condition| condition.description)
            .ok_or_else(|| AdvisoryError::upstream("OpenWeather response has no conditions"))?;

        let country_code = self
            .sys
            .country
            .filter(|code| !code.trim().is_empty())
            .ok_or_else(|| AdvisoryError::upstream("OpenWeather response has no country code"))?;

        Ok(WeatherReport {
            description,
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            humidity: self.main.humidity,
            wind_speed: self.wind.speed,
            sunrise: self.sys.sunrise,
            sunset: self.sys.sunset,
            utc_offset_seconds: self.timezone,
            country_code,
        })
    }
}

//! Weather lookup
//!
//! [`WeatherLookup`] is the seam the sync pipeline talks to. The report it
//! returns still carries raw epoch times; [`WeatherReport::snapshot`] renders
//! them into the local `hh:mm AM/PM` form the advisory engine reads.

use async_trait::async_trait;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::models::WeatherSnapshot;

pub mod open_weather;

pub use open_weather::OpenWeatherClient;

const LOCAL_TIME_FORMAT: &str = "%I:%M %p";

/// Current weather for a city, as reported upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub description: String,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Perceived temperature in Celsius
    pub feels_like: f64,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Sunrise, unix seconds
    pub sunrise: i64,
    /// Sunset, unix seconds
    pub sunset: i64,
    /// Shift from UTC in seconds for the city
    pub utc_offset_seconds: i32,
    /// ISO 3166-1 alpha-2 code of the country the city is in
    pub country_code: String,
}

impl WeatherReport {
    #[must_use]
    pub fn snapshot(&self) -> WeatherSnapshot {
        WeatherSnapshot {
            description: self.description.clone(),
            temperature: self.temperature,
            feels_like: self.feels_like,
            humidity: self.humidity,
            wind_speed: self.wind_speed,
            sunrise: format_local_time(self.sunrise, self.utc_offset_seconds),
            sunset: format_local_time(self.sunset, self.utc_offset_seconds),
        }
    }
}

/// Source of current weather by city name
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn fetch(&self, city: &str) -> Result<WeatherReport>;
}

/// Render a unix timestamp as local `hh:mm AM/PM`, given the UTC offset of the
/// location. Timestamps outside chrono's range render as an empty string.
#[must_use]
pub fn format_local_time(epoch_seconds: i64, utc_offset_seconds: i32) -> String {
    epoch_seconds
        .checked_add(i64::from(utc_offset_seconds))
        .and_then(|local| DateTime::from_timestamp(local, 0))
        .map(|local| local.format(LOCAL_TIME_FORMAT).to_string())
        .unwrap_or_default()
}

//! Weather snapshot model and display methods

use serde::{Deserialize, Serialize};

/// Point-in-time weather read for one city
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// Human-readable description of weather conditions
    pub description: String,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Perceived temperature in Celsius
    pub feels_like: f64,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Local sunrise as `hh:mm AM/PM`
    pub sunrise: String,
    /// Local sunset as `hh:mm AM/PM`
    pub sunset: String,
}

impl WeatherSnapshot {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C (feels like {:.1}°C)", self.temperature, self.feels_like)
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{:.1} m/s", self.wind_speed)
    }

    #[must_use]
    pub fn format_daylight(&self) -> String {
        format!("{} - {}", self.sunrise, self.sunset)
    }
}

//! Configuration management for the travel advisor
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::AdvisoryError;
use crate::refresh::RefreshSettings;
use crate::sync::SyncSettings;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const APP_DIR: &str = "travel-advisor";

/// Root configuration structure for the travel advisor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// HTTP API settings
    pub server: ServerConfig,
    /// OpenWeatherMap client settings
    pub weather: WeatherConfig,
    /// REST Countries client settings
    pub country: CountryConfig,
    /// GeoNames city discovery settings
    pub cities: CitiesConfig,
    /// Single-city sync settings
    pub sync: SyncConfig,
    /// Periodic refresh settings
    pub scheduler: SchedulerConfig,
    /// Advisory store settings
    pub store: StoreConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Shared secret expected as `Authorization: Bearer <token>`; open API when unset
    pub bearer_token: Option<String>,
    /// Return per-city audit types from multi-city refreshes
    #[serde(default = "default_true")]
    pub multi_city_audit: bool,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key
    pub api_key: Option<String>,
    /// Base URL for weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Country API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryConfig {
    #[serde(default = "default_country_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// City discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitiesConfig {
    #[serde(default = "default_cities_base_url")]
    pub base_url: String,
    /// GeoNames account name; discovery is skipped without one
    pub username: Option<String>,
    /// How many top cities to pull per country
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Parallel syncs during a country refresh
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Keep the first-seen `created_at` when a city is synced again
    #[serde(default = "default_true")]
    pub preserve_created_at: bool,
}

/// Periodic refresh settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_initial_delay")]
    pub initial_delay_seconds: u64,
    /// Delay between the end of one run and the start of the next
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// IANA timezone used for run timestamps in logs
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Advisory store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// `fjall` or `memory`
    #[serde(default = "default_store_backend")]
    pub backend: String,
    /// Directory for the on-disk store
    #[serde(default = "default_store_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_country_base_url() -> String {
    "https://restcountries.com".to_string()
}

fn default_cities_base_url() -> String {
    "http://api.geonames.org".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_top_n() -> usize {
    10
}

fn default_concurrency() -> usize {
    5
}

fn default_initial_delay() -> u64 {
    30
}

fn default_interval() -> u64 {
    300
}

fn default_batch_size() -> usize {
    100
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_store_backend() -> String {
    "fjall".to_string()
}

fn default_store_location() -> String {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR).join("advisories"))
        .unwrap_or_else(|| PathBuf::from(".travel-advisor"))
        .to_string_lossy()
        .into_owned()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            bearer_token: None,
            multi_city_audit: true,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for CountryConfig {
    fn default() -> Self {
        Self {
            base_url: default_country_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for CitiesConfig {
    fn default() -> Self {
        Self {
            base_url: default_cities_base_url(),
            username: None,
            top_n: default_top_n(),
            concurrency: default_concurrency(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            preserve_created_at: true,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay_seconds: default_initial_delay(),
            interval_seconds: default_interval(),
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            timezone: default_timezone(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            location: default_store_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AdvisorConfig {
    /// Load configuration from the given path, or the default location when
    /// none is given, then overlay environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // ADVISOR_WEATHER__API_KEY -> weather.api_key
        builder = builder.add_source(
            Environment::with_prefix("ADVISOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AdvisorConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Apply default values to blank configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.country.base_url.is_empty() {
            self.country.base_url = default_country_base_url();
        }
        if self.country.timeout_seconds == 0 {
            self.country.timeout_seconds = default_timeout();
        }
        if self.cities.base_url.is_empty() {
            self.cities.base_url = default_cities_base_url();
        }
        if self.cities.timeout_seconds == 0 {
            self.cities.timeout_seconds = default_timeout();
        }
        if self.scheduler.timezone.is_empty() {
            self.scheduler.timezone = default_timezone();
        }
        if self.store.backend.is_empty() {
            self.store.backend = default_store_backend();
        }
        if self.store.location.is_empty() {
            self.store.location = default_store_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_credentials()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and tokens
    pub fn validate_credentials(&self) -> Result<()> {
        if let Some(token) = &self.server.bearer_token {
            if token.trim().is_empty() {
                return Err(AdvisoryError::config(
                    "Bearer token cannot be empty if provided. Either remove it or set a token.",
                )
                .into());
            }
        }

        if let Some(api_key) = &self.weather.api_key {
            if api_key.trim().is_empty() {
                return Err(AdvisoryError::config(
                    "Weather API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("Weather", self.weather.timeout_seconds, self.weather.max_retries),
            ("Country", self.country.timeout_seconds, self.country.max_retries),
            ("Cities", self.cities.timeout_seconds, self.cities.max_retries),
        ];
        for (name, timeout, retries) in timeouts {
            if timeout > 300 {
                return Err(AdvisoryError::config(format!(
                    "{name} API timeout cannot exceed 300 seconds"
                ))
                .into());
            }
            if retries > 10 {
                return Err(AdvisoryError::config(format!(
                    "{name} API max retries cannot exceed 10"
                ))
                .into());
            }
        }

        if self.cities.top_n == 0 || self.cities.top_n > 1000 {
            return Err(AdvisoryError::config("Top city count must be between 1 and 1000").into());
        }

        if self.cities.concurrency == 0 || self.cities.concurrency > 64 {
            return Err(AdvisoryError::config(
                "Country refresh concurrency must be between 1 and 64",
            )
            .into());
        }

        if self.scheduler.concurrency == 0 || self.scheduler.concurrency > 64 {
            return Err(
                AdvisoryError::config("Scheduler concurrency must be between 1 and 64").into(),
            );
        }

        if self.scheduler.batch_size == 0 {
            return Err(AdvisoryError::config("Scheduler batch size must be positive").into());
        }

        if self.scheduler.interval_seconds == 0 {
            return Err(AdvisoryError::config("Scheduler interval must be positive").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AdvisoryError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AdvisoryError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let valid_backends = ["fjall", "memory"];
        if !valid_backends.contains(&self.store.backend.as_str()) {
            return Err(AdvisoryError::config(format!(
                "Invalid store backend '{}'. Must be one of: {}",
                self.store.backend,
                valid_backends.join(", ")
            ))
            .into());
        }

        let base_urls = [
            ("Weather", &self.weather.base_url),
            ("Country", &self.country.base_url),
            ("Cities", &self.cities.base_url),
        ];
        for (name, url) in base_urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AdvisoryError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.scheduler.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(AdvisoryError::config(format!(
                "Unknown scheduler timezone '{}'",
                self.scheduler.timezone
            ))
            .into());
        }

        Ok(())
    }

    /// Settings for country and full refreshes
    #[must_use]
    pub fn refresh_settings(&self) -> RefreshSettings {
        RefreshSettings {
            concurrency: self.cities.concurrency,
            top_n: self.cities.top_n,
        }
    }

    /// Settings for single-city syncs
    #[must_use]
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            preserve_created_at: self.sync.preserve_created_at,
        }
    }
}

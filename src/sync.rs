//! Single-city sync
//!
//! Fetches weather for a city, resolves its country from the code the weather
//! service reports, merges both into a [`TravelAdvisory`] and persists it.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::city_key::CityKey;
use crate::country::CountryLookup;
use crate::models::{AuditType, SyncedAdvisory, TravelAdvisory};
use crate::store::{AdvisoryStore, SaveOutcome};
use crate::weather::WeatherLookup;
use crate::{AdvisoryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Carry the first `created_at` forward through an atomic upsert. When
    /// false every sync resets `created_at` and classification is a separate
    /// existence check before the write.
    pub preserve_created_at: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            preserve_created_at: true,
        }
    }
}

pub struct SyncPipeline {
    store: Arc<dyn AdvisoryStore>,
    weather: Arc<dyn WeatherLookup>,
    countries: Arc<dyn CountryLookup>,
    settings: SyncSettings,
}

impl SyncPipeline {
    pub fn new(
        store: Arc<dyn AdvisoryStore>,
        weather: Arc<dyn WeatherLookup>,
        countries: Arc<dyn CountryLookup>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            store,
            weather,
            countries,
            settings,
        }
    }

    /// Sync one city and return the record as persisted
    pub async fn sync_city(&self, city: &str) -> Result<TravelAdvisory> {
        Ok(self.sync_city_with_audit(city).await?.advisory)
    }

    /// Sync one city and report whether the write created or replaced a record
    #[instrument(skip(self))]
    pub async fn sync_city_with_audit(&self, city: &str) -> Result<SyncedAdvisory> {
        let key = CityKey::parse(city)?;
        let record = self.assemble(city.trim(), key).await?;
        let outcome = self.write(record).await?;

        let audit = AuditType::from_existed(outcome.existed);
        info!("Audit: city={} type={}", outcome.advisory.city, audit);

        Ok(SyncedAdvisory {
            advisory: outcome.advisory,
            audit,
        })
    }

    async fn assemble(&self, city: &str, key: CityKey) -> Result<TravelAdvisory> {
        info!("Syncing city={}", city);

        let weather = self.weather.fetch(city).await?;
        debug!("Weather fetched for city={}", city);

        let code = weather.country_code.trim();
        if code.is_empty() {
            return Err(AdvisoryError::upstream(format!(
                "weather for {city} carries no country code"
            )));
        }
        let country = self.countries.by_code(code).await?;

        let now = Utc::now();
        Ok(TravelAdvisory {
            key: key.into_inner(),
            city: city.to_string(),
            weather: weather.snapshot(),
            country: country.snapshot(),
            synced_at: now,
            created_at: now,
        })
    }

    async fn write(&self, record: TravelAdvisory) -> Result<SaveOutcome> {
        if self.settings.preserve_created_at {
            return self.store.upsert(record).await;
        }

        // check-then-write; two concurrent syncs of one key can both see "missing"
        let existed = self.store.exists_by_id(&record.key).await?;
        let advisory = self.store.save(record).await?;
        Ok(SaveOutcome { advisory, existed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::CountryReport;
    use crate::store::MemoryStore;
    use crate::weather::WeatherReport;
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    struct FixedWeather {
        country_code: &'static str,
    }

    #[async_trait]
    impl WeatherLookup for FixedWeather {
        async fn fetch(&self, city: &str) -> Result<WeatherReport> {
            if city.eq_ignore_ascii_case("atlantis") {
                return Err(AdvisoryError::upstream("OpenWeatherMap: city not found"));
            }
            Ok(WeatherReport {
                description: "light rain".to_string(),
                temperature: 12.0,
                feels_like: 10.5,
                humidity: 80,
                wind_speed: 4.0,
                sunrise: 1_704_090_600,
                sunset: 1_704_123_000,
                utc_offset_seconds: 0,
                country_code: self.country_code.to_string(),
            })
        }
    }

    struct FixedCountries;

    #[async_trait]
    impl CountryLookup for FixedCountries {
        async fn by_code(&self, code: &str) -> Result<CountryReport> {
            Ok(CountryReport {
                code: Some(code.to_string()),
                name: "United Kingdom".to_string(),
                capitals: vec!["London".to_string()],
                timezones: vec!["UTC".to_string()],
                languages: BTreeMap::from([("eng".to_string(), "English".to_string())]),
                flag_url: "https://flagcdn.com/w320/gb.png".to_string(),
                currencies: vec!["GBP".to_string()],
                population: 67_000_000,
                region: "Europe".to_string(),
            })
        }

        async fn by_name(&self, name: &str) -> Result<CountryReport> {
            self.by_code(name).await
        }
    }

    fn pipeline(store: Arc<MemoryStore>, preserve_created_at: bool) -> SyncPipeline {
        SyncPipeline::new(
            store,
            Arc::new(FixedWeather { country_code: "GB" }),
            Arc::new(FixedCountries),
            SyncSettings {
                preserve_created_at,
            },
        )
    }

    #[tokio::test]
    async fn test_sync_city_builds_merged_record() {
        let store = Arc::new(MemoryStore::new());
        let saved = pipeline(store.clone(), true)
            .sync_city("  Manchester ")
            .await
            .unwrap();

        assert_eq!(saved.key, "manchester");
        assert_eq!(saved.city, "Manchester");
        assert_eq!(saved.weather.sunrise, "06:30 AM");
        assert_eq!(saved.country.currency.as_deref(), Some("GBP"));
        assert_eq!(saved.country.capital.as_deref(), Some("London"));
        assert!(store.exists_by_id("manchester").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_city_never_reaches_upstream() {
        let store = Arc::new(MemoryStore::new());
        let err = pipeline(store.clone(), true).sync_city("L1").await.unwrap_err();

        assert!(matches!(err, AdvisoryError::Validation { .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_upstream_failure_persists_nothing() {
        let store = Arc::new(MemoryStore::new());
        let err = pipeline(store.clone(), true).sync_city("Atlantis").await.unwrap_err();

        assert!(matches!(err, AdvisoryError::Upstream { .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_country_code_is_upstream_error() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = SyncPipeline::new(
            store.clone(),
            Arc::new(FixedWeather { country_code: " " }),
            Arc::new(FixedCountries),
            SyncSettings::default(),
        );

        let err = pipeline.sync_city("Manchester").await.unwrap_err();
        assert!(matches!(err, AdvisoryError::Upstream { .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_audit_created_then_updated() {
        for preserve in [true, false] {
            let store = Arc::new(MemoryStore::new());
            let pipeline = pipeline(store, preserve);

            let first = pipeline.sync_city_with_audit("Leeds").await.unwrap();
            let second = pipeline.sync_city_with_audit("leeds").await.unwrap();

            assert_eq!(first.audit, AuditType::Created);
            assert_eq!(second.audit, AuditType::Updated);
        }
    }

    #[tokio::test]
    async fn test_created_at_modes() {
        let store = Arc::new(MemoryStore::new());
        let first = pipeline(store.clone(), true).sync_city("York").await.unwrap();

        let preserved = pipeline(store.clone(), true).sync_city("York").await.unwrap();
        assert_eq!(preserved.created_at, first.created_at);
        assert!(preserved.synced_at >= first.synced_at);

        let reset = pipeline(store.clone(), false).sync_city("York").await.unwrap();
        assert_eq!(reset.created_at, reset.synced_at);
        assert!(reset.created_at >= first.created_at);
    }
}

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use travel_advisor::cities::CityDiscovery;
use travel_advisor::country::{CountryLookup, CountryReport};
use travel_advisor::weather::{WeatherLookup, WeatherReport};
use travel_advisor::store::{AdvisoryFilter, SaveOutcome};
use travel_advisor::{
    AdvisoryError, AdvisoryService, AdvisoryStore, CountrySnapshot, MemoryStore,
    RefreshOrchestrator, RefreshSettings, Result, SyncPipeline, SyncSettings, TravelAdvisory,
    WeatherSnapshot,
};

/// Weather keyed by lower-cased city name, with in-flight tracking
#[derive(Default)]
pub struct FakeWeather {
    cities: HashMap<String, (String, f64)>,
    failing: HashSet<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: AtomicUsize,
}

impl FakeWeather {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn city(self, name: &str, country_code: &str) -> Self {
        self.city_at(name, country_code, 20.0)
    }

    pub fn city_at(mut self, name: &str, country_code: &str, temperature: f64) -> Self {
        self.cities.insert(
            name.trim().to_lowercase(),
            (country_code.to_string(), temperature),
        );
        self
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.trim().to_lowercase());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherLookup for FakeWeather {
    async fn fetch(&self, city: &str) -> Result<WeatherReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let key = city.trim().to_lowercase();
        if self.failing.contains(&key) {
            return Err(AdvisoryError::upstream("OpenWeather: service unavailable"));
        }
        let (country_code, temperature) = self
            .cities
            .get(&key)
            .cloned()
            .ok_or_else(|| AdvisoryError::upstream(format!("OpenWeather: {city} not found")))?;

        Ok(WeatherReport {
            description: "clear sky".to_string(),
            temperature,
            feels_like: temperature - 1.0,
            humidity: 40,
            wind_speed: 2.5,
            sunrise: 1_718_946_000,
            sunset: 1_719_003_600,
            utc_offset_seconds: 7200,
            country_code,
        })
    }
}

#[derive(Default)]
pub struct FakeCountries {
    countries: Vec<CountryReport>,
    fail_by_name: bool,
}

pub fn country_report(code: Option<&str>, name: &str, capitals: &[&str]) -> CountryReport {
    CountryReport {
        code: code.map(str::to_string),
        name: name.to_string(),
        capitals: capitals.iter().map(|c| c.to_string()).collect(),
        timezones: vec!["UTC+01:00".to_string()],
        languages: BTreeMap::from([("xx".to_string(), "Language".to_string())]),
        flag_url: format!("https://flagcdn.com/w320/{}.png", name.to_lowercase()),
        currencies: vec!["EUR".to_string()],
        population: 10_000_000,
        region: "Europe".to_string(),
    }
}

impl FakeCountries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn country(mut self, code: Option<&str>, name: &str, capitals: &[&str]) -> Self {
        self.countries.push(country_report(code, name, capitals));
        self
    }

    pub fn failing_by_name(mut self) -> Self {
        self.fail_by_name = true;
        self
    }
}

#[async_trait]
impl CountryLookup for FakeCountries {
    async fn by_code(&self, code: &str) -> Result<CountryReport> {
        self.countries
            .iter()
            .find(|c| c.code.as_deref() == Some(code))
            .cloned()
            .ok_or_else(|| AdvisoryError::upstream(format!("REST Countries: {code} not found")))
    }

    async fn by_name(&self, name: &str) -> Result<CountryReport> {
        if self.fail_by_name {
            return Err(AdvisoryError::upstream("REST Countries: rate limit exceeded"));
        }
        self.countries
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
            .cloned()
            .ok_or_else(|| AdvisoryError::upstream(format!("REST Countries: {name} not found")))
    }
}

#[derive(Default)]
pub struct FakeCities {
    by_code: HashMap<String, Vec<String>>,
    pub requests: Mutex<Vec<(String, usize)>>,
}

impl FakeCities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top(mut self, code: &str, cities: &[&str]) -> Self {
        self.by_code
            .insert(code.to_string(), cities.iter().map(|c| c.to_string()).collect());
        self
    }
}

#[async_trait]
impl CityDiscovery for FakeCities {
    async fn top_cities(&self, country_code: &str, limit: usize) -> Vec<String> {
        self.requests
            .lock()
            .await
            .push((country_code.to_string(), limit));
        self.by_code
            .get(country_code)
            .map(|cities| cities.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub weather: Arc<FakeWeather>,
    pub cities: Arc<FakeCities>,
    pub orchestrator: Arc<RefreshOrchestrator>,
    pub service: Arc<AdvisoryService>,
}

pub fn harness(
    weather: FakeWeather,
    countries: FakeCountries,
    cities: FakeCities,
    settings: RefreshSettings,
) -> Harness {
    harness_with(weather, countries, cities, settings, SyncSettings::default())
}

pub fn harness_with(
    weather: FakeWeather,
    countries: FakeCountries,
    cities: FakeCities,
    settings: RefreshSettings,
    sync: SyncSettings,
) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let weather = Arc::new(weather);
    let countries = Arc::new(countries);
    let cities = Arc::new(cities);

    let pipeline = Arc::new(SyncPipeline::new(
        store.clone(),
        weather.clone(),
        countries.clone(),
        sync,
    ));
    let orchestrator = Arc::new(RefreshOrchestrator::new(
        pipeline,
        store.clone(),
        countries,
        cities.clone(),
        settings,
    ));
    let service = Arc::new(AdvisoryService::new(store.clone(), orchestrator.clone()));

    Harness {
        store,
        weather,
        cities,
        orchestrator,
        service,
    }
}

/// Memory store that counts full-record listings
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub find_all_calls: AtomicUsize,
}

impl CountingStore {
    pub fn find_all_calls(&self) -> usize {
        self.find_all_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdvisoryStore for CountingStore {
    async fn exists_by_id(&self, key: &str) -> Result<bool> {
        self.inner.exists_by_id(key).await
    }

    async fn find_by_id(&self, key: &str) -> Result<Option<TravelAdvisory>> {
        self.inner.find_by_id(key).await
    }

    async fn find_all(&self) -> Result<Vec<TravelAdvisory>> {
        self.find_all_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_all().await
    }

    async fn find_all_filtered(&self, filter: AdvisoryFilter<'_>) -> Result<Vec<TravelAdvisory>> {
        self.inner.find_all_filtered(filter).await
    }

    async fn list_cities(&self) -> Result<Vec<String>> {
        self.inner.list_cities().await
    }

    async fn save(&self, advisory: TravelAdvisory) -> Result<TravelAdvisory> {
        self.inner.save(advisory).await
    }

    async fn upsert(&self, advisory: TravelAdvisory) -> Result<SaveOutcome> {
        self.inner.upsert(advisory).await
    }

    async fn delete_by_id(&self, key: &str) -> Result<()> {
        self.inner.delete_by_id(key).await
    }

    async fn delete_by_keys(&self, keys: &[String]) -> Result<usize> {
        self.inner.delete_by_keys(keys).await
    }
}

/// Orchestrator over any store, with default sync settings
pub fn orchestrator_over(
    store: Arc<dyn AdvisoryStore>,
    weather: Arc<FakeWeather>,
    countries: FakeCountries,
    settings: RefreshSettings,
) -> RefreshOrchestrator {
    let countries = Arc::new(countries);
    let pipeline = Arc::new(SyncPipeline::new(
        store.clone(),
        weather,
        countries.clone(),
        SyncSettings::default(),
    ));
    RefreshOrchestrator::new(pipeline, store, countries, Arc::new(FakeCities::new()), settings)
}

/// A record as an earlier sync would have left it
pub fn stored(
    city: &str,
    country: &str,
    temperature: f64,
    synced_at: DateTime<Utc>,
) -> TravelAdvisory {
    TravelAdvisory {
        key: city.trim().to_lowercase(),
        city: city.to_string(),
        weather: WeatherSnapshot {
            description: "overcast clouds".to_string(),
            temperature,
            feels_like: temperature,
            humidity: 55,
            wind_speed: 3.0,
            sunrise: "06:00 AM".to_string(),
            sunset: "08:00 PM".to_string(),
        },
        country: CountrySnapshot {
            name: country.to_string(),
            currency: Some("EUR".to_string()),
            capital: None,
            timezones: vec!["UTC+01:00".to_string()],
            languages: BTreeMap::new(),
            flag_url: String::new(),
            population: 1,
            region: "Europe".to_string(),
        },
        synced_at,
        created_at: synced_at,
    }
}

pub async fn seed(store: &MemoryStore, advisories: Vec<TravelAdvisory>) {
    for advisory in advisories {
        store.save(advisory).await.unwrap();
    }
}

pub fn sorted_keys(advisories: impl IntoIterator<Item = TravelAdvisory>) -> Vec<String> {
    let mut keys: Vec<String> = advisories.into_iter().map(|a| a.key).collect();
    keys.sort();
    keys
}

//! Refresh orchestration
//!
//! Decides which cities to re-sync and drives the [`SyncPipeline`] over them.
//! Multi-city refreshes run at most `concurrency` syncs at a time and never
//! fail as a whole: a city that cannot be synced is logged and left out of the
//! result. Only [`RefreshOrchestrator::refresh_city`] surfaces errors.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use tracing::{error, info, instrument, warn};

use crate::Result;
use crate::cities::CityDiscovery;
use crate::city_key::{self, CityKey};
use crate::country::CountryLookup;
use crate::models::{SyncedAdvisory, TravelAdvisory};
use crate::store::AdvisoryStore;
use crate::sync::SyncPipeline;

/// Bounds for multi-city refreshes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSettings {
    /// Syncs in flight at once
    pub concurrency: usize,
    /// Cities pulled from discovery for a country refresh
    pub top_n: usize,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            concurrency: 5,
            top_n: 10,
        }
    }
}

pub struct RefreshOrchestrator {
    pipeline: Arc<SyncPipeline>,
    store: Arc<dyn AdvisoryStore>,
    countries: Arc<dyn CountryLookup>,
    cities: Arc<dyn CityDiscovery>,
    settings: RefreshSettings,
}

impl RefreshOrchestrator {
    pub fn new(
        pipeline: Arc<SyncPipeline>,
        store: Arc<dyn AdvisoryStore>,
        countries: Arc<dyn CountryLookup>,
        cities: Arc<dyn CityDiscovery>,
        settings: RefreshSettings,
    ) -> Self {
        Self {
            pipeline,
            store,
            countries,
            cities,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> RefreshSettings {
        self.settings
    }

    /// Re-sync one city; validation and upstream errors propagate
    pub async fn refresh_city(&self, city: &str) -> Result<SyncedAdvisory> {
        let key = CityKey::parse(city)?;
        info!("Refreshing advisory for city={}", key);
        self.pipeline.sync_city_with_audit(city).await
    }

    /// Re-sync every stored city of a country plus its most populous cities
    #[instrument(skip(self))]
    pub async fn refresh_country(&self, country: &str) -> Vec<SyncedAdvisory> {
        let country = country.trim();
        info!("Refreshing advisories for country={}", country);

        let (stored, discovered) =
            futures::join!(self.stored_in_country(country), self.top_cities(country));

        let mut union = BTreeMap::new();
        for advisory in stored {
            union.entry(advisory.key).or_insert(advisory.city);
        }
        for name in discovered {
            match city_key::normalize(&name) {
                Ok(key) => {
                    union.entry(key).or_insert_with(|| name.trim().to_string());
                }
                Err(e) => warn!("Skipping discovered city {:?}: {}", name, e),
            }
        }

        info!("Syncing {} cities for {}", union.len(), country);
        self.sync_all(union.into_values().collect(), self.settings.concurrency)
            .await
    }

    /// Re-sync every stored city
    #[instrument(skip(self))]
    pub async fn refresh_all(&self) -> Vec<SyncedAdvisory> {
        info!("Refreshing all advisories");
        let cities = self.stored_cities().await;
        self.sync_all(cities, self.settings.concurrency).await
    }

    /// Re-sync every stored city in sequential batches of `batch_size`, with up
    /// to `concurrency` syncs in flight inside a batch. Only display names are
    /// read from the store, when the stream is first polled; a batch starts only
    /// after the previous one has drained.
    pub fn refresh_all_in_batches(
        &self,
        batch_size: usize,
        concurrency: usize,
    ) -> BoxStream<'_, SyncedAdvisory> {
        let batch_size = batch_size.max(1);

        stream::once(self.stored_cities())
            .flat_map(move |cities| {
                info!(
                    "Refreshing {} cities in {} batches",
                    cities.len(),
                    cities.len().div_ceil(batch_size)
                );
                let mut names = cities.into_iter();
                stream::iter(std::iter::from_fn(move || {
                    let batch: Vec<String> = names.by_ref().take(batch_size).collect();
                    (!batch.is_empty()).then_some(batch)
                }))
            })
            .then(move |batch| self.sync_all(batch, concurrency))
            .flat_map(stream::iter)
            .boxed()
    }

    async fn sync_all(&self, cities: Vec<String>, concurrency: usize) -> Vec<SyncedAdvisory> {
        let total = cities.len();

        let synced: Vec<SyncedAdvisory> = stream::iter(cities)
            .map(|city| self.sync_isolated(city))
            .buffer_unordered(concurrency.max(1))
            .filter_map(|result| async move { result })
            .collect()
            .await;

        if synced.len() < total {
            warn!("Synced {} of {} cities", synced.len(), total);
        }
        synced
    }

    async fn sync_isolated(&self, city: String) -> Option<SyncedAdvisory> {
        match self.pipeline.sync_city_with_audit(&city).await {
            Ok(synced) => Some(synced),
            Err(e) => {
                warn!("Failed syncing city {}: {}", city, e);
                None
            }
        }
    }

    /// Display names of every stored city, one per key
    async fn stored_cities(&self) -> Vec<String> {
        match self.store.list_cities().await {
            Ok(names) => dedupe_by_key(names),
            Err(e) => {
                error!("Could not list stored advisories: {}", e);
                Vec::new()
            }
        }
    }

    async fn stored_in_country(&self, country: &str) -> Vec<TravelAdvisory> {
        let filter = |advisory: &TravelAdvisory| advisory.country.matches_name(country);
        match self.store.find_all_filtered(&filter).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Could not read stored advisories for {}: {}", country, e);
                Vec::new()
            }
        }
    }

    /// Discovery list for a country, falling back to its capitals
    async fn top_cities(&self, country: &str) -> Vec<String> {
        let report = match self.countries.by_name(country).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Failed to fetch top cities for {}: {}", country, e);
                return Vec::new();
            }
        };

        let Some(code) = report.iso_code().map(str::to_string) else {
            warn!("No country code found for {}, using capitals only", report.name);
            return report.capitals;
        };
        info!(
            "Country: {}, ISO Code: {}, Capitals: {:?}",
            report.name, code, report.capitals
        );

        let discovered = self.cities.top_cities(&code, self.settings.top_n.max(1)).await;
        if discovered.is_empty() {
            report.capitals
        } else {
            discovered
        }
    }
}

fn dedupe_by_key(names: Vec<String>) -> Vec<String> {
    let mut unique = BTreeMap::new();
    for name in names {
        match city_key::normalize(&name) {
            Ok(key) => {
                unique.entry(key).or_insert(name);
            }
            Err(e) => warn!("Skipping stored city {:?}: {}", name, e),
        }
    }
    unique.into_values().collect()
}

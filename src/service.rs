//! Read, search, refresh and delete operations shared by the HTTP API and the CLI

use std::sync::Arc;

use tracing::{info, warn};

use crate::city_key;
use crate::models::{SyncedAdvisory, TravelAdvisory};
use crate::refresh::RefreshOrchestrator;
use crate::store::AdvisoryStore;
use crate::{AdvisoryError, Result};

/// What a refresh request produced
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// An explicit single-city refresh
    City(SyncedAdvisory),
    /// A country-scoped or global refresh; failed cities are left out
    Cities(Vec<SyncedAdvisory>),
}

impl RefreshOutcome {
    #[must_use]
    pub fn into_synced(self) -> Vec<SyncedAdvisory> {
        match self {
            RefreshOutcome::City(synced) => vec![synced],
            RefreshOutcome::Cities(synced) => synced,
        }
    }
}

pub struct AdvisoryService {
    store: Arc<dyn AdvisoryStore>,
    orchestrator: Arc<RefreshOrchestrator>,
}

impl AdvisoryService {
    pub fn new(store: Arc<dyn AdvisoryStore>, orchestrator: Arc<RefreshOrchestrator>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    #[must_use]
    pub fn orchestrator(&self) -> Arc<RefreshOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    /// One city by key, every advisory of a country, or everything.
    /// `city` wins when both are given.
    pub async fn fetch(
        &self,
        city: Option<&str>,
        country: Option<&str>,
    ) -> Result<Vec<TravelAdvisory>> {
        if let Some(city) = city {
            info!("Fetching advisory for city={}", city);
            let key = city_key::normalize(city)?;
            return Ok(self.store.find_by_id(&key).await?.into_iter().collect());
        }

        if let Some(country) = country {
            info!("Fetching advisories for country={}", country);
            let filter = |advisory: &TravelAdvisory| advisory.country.matches_name(country);
            return self.store.find_all_filtered(&filter).await;
        }

        self.store.find_all().await
    }

    /// Advisories whose temperature lies in `[min, max]`
    pub async fn search_by_temperature(&self, min: f64, max: f64) -> Result<Vec<TravelAdvisory>> {
        if min.is_nan() || max.is_nan() {
            return Err(AdvisoryError::validation("Temperature bounds must be numbers"));
        }
        if min > max {
            return Err(AdvisoryError::validation(
                "Minimum temperature cannot exceed maximum",
            ));
        }

        let filter = |advisory: &TravelAdvisory| {
            (min..=max).contains(&advisory.weather.temperature)
        };
        self.store.find_all_filtered(&filter).await
    }

    pub async fn refresh(
        &self,
        city: Option<&str>,
        country: Option<&str>,
    ) -> Result<RefreshOutcome> {
        if let Some(city) = city {
            return self
                .orchestrator
                .refresh_city(city)
                .await
                .map(RefreshOutcome::City);
        }

        let synced = match country {
            Some(country) => self.orchestrator.refresh_country(country).await,
            None => self.orchestrator.refresh_all().await,
        };
        Ok(RefreshOutcome::Cities(synced))
    }

    /// Deleting a city that was never stored is not an error
    pub async fn delete_city(&self, city: &str) -> Result<()> {
        let key = city_key::normalize(city)?;
        warn!("Deleting advisory for city={}", city);
        self.store.delete_by_id(&key).await
    }

    /// Delete every advisory of a country, returning how many were removed
    pub async fn delete_country(&self, country: &str) -> Result<usize> {
        let country = country.trim();
        if country.is_empty() {
            return Err(AdvisoryError::validation("Country is required"));
        }

        let keys: Vec<String> = self
            .fetch(None, Some(country))
            .await?
            .into_iter()
            .map(|advisory| advisory.key)
            .collect();

        let removed = self.store.delete_by_keys(&keys).await?;
        warn!("Deleted {} advisories for country={}", removed, country);
        Ok(removed)
    }
}

//! Advisory persistence
//!
//! A key-value document store of [`TravelAdvisory`] records keyed by the
//! normalized city name. Implementations must be safe to call concurrently; the
//! refresh orchestrator places no locks of its own around store calls.

use async_trait::async_trait;

use crate::Result;
use crate::models::TravelAdvisory;

pub mod fjall_store;
pub mod memory;

pub use fjall_store::FjallStore;
pub use memory::MemoryStore;

/// Predicate used by [`AdvisoryStore::find_all_filtered`]
pub type AdvisoryFilter<'a> = &'a (dyn Fn(&TravelAdvisory) -> bool + Send + Sync);

/// Result of an atomic upsert
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    /// The record as persisted
    pub advisory: TravelAdvisory,
    /// Whether a record existed under the key before this write
    pub existed: bool,
}

#[async_trait]
pub trait AdvisoryStore: Send + Sync {
    async fn exists_by_id(&self, key: &str) -> Result<bool>;

    async fn find_by_id(&self, key: &str) -> Result<Option<TravelAdvisory>>;

    async fn find_all(&self) -> Result<Vec<TravelAdvisory>>;

    /// Display name of every stored record, without holding the records
    async fn list_cities(&self) -> Result<Vec<String>>;

    async fn find_all_filtered(&self, filter: AdvisoryFilter<'_>) -> Result<Vec<TravelAdvisory>> {
        let all = self.find_all().await?;
        Ok(all.into_iter().filter(|advisory| filter(advisory)).collect())
    }

    /// Write the record as given, replacing any record under the same key
    async fn save(&self, advisory: TravelAdvisory) -> Result<TravelAdvisory>;

    /// Write the record in one atomic step, reporting whether the key already
    /// existed. An existing record's `created_at` is carried forward.
    async fn upsert(&self, advisory: TravelAdvisory) -> Result<SaveOutcome>;

    /// Removing a missing key is not an error
    async fn delete_by_id(&self, key: &str) -> Result<()>;

    /// Returns how many of the keys were present
    async fn delete_by_keys(&self, keys: &[String]) -> Result<usize>;
}

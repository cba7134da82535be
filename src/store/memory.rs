//! In-process advisory store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{AdvisoryStore, SaveOutcome};
use crate::Result;
use crate::models::TravelAdvisory;

/// Advisory store backed by a map; contents are lost on drop
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, TravelAdvisory>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl AdvisoryStore for MemoryStore {
    async fn exists_by_id(&self, key: &str) -> Result<bool> {
        Ok(self.records.read().await.contains_key(key))
    }

    async fn find_by_id(&self, key: &str) -> Result<Option<TravelAdvisory>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn find_all(&self) -> Result<Vec<TravelAdvisory>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn list_cities(&self) -> Result<Vec<String>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .map(|advisory| advisory.city.clone())
            .collect())
    }

    async fn save(&self, advisory: TravelAdvisory) -> Result<TravelAdvisory> {
        self.records
            .write()
            .await
            .insert(advisory.key.clone(), advisory.clone());
        Ok(advisory)
    }

    async fn upsert(&self, mut advisory: TravelAdvisory) -> Result<SaveOutcome> {
        let mut records = self.records.write().await;
        let existed = match records.get(&advisory.key) {
            Some(previous) => {
                advisory.created_at = previous.created_at;
                true
            }
            None => false,
        };
        records.insert(advisory.key.clone(), advisory.clone());

        Ok(SaveOutcome { advisory, existed })
    }

    async fn delete_by_id(&self, key: &str) -> Result<()> {
        self.records.write().await.remove(key);
        Ok(())
    }

    async fn delete_by_keys(&self, keys: &[String]) -> Result<usize> {
        let mut records = self.records.write().await;
        Ok(keys.iter().filter(|key| records.remove(*key).is_some()).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::advisory;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_upsert_reports_existence_and_keeps_created_at() {
        let store = MemoryStore::new();
        let first_sync = Utc::now() - Duration::hours(3);

        let created = store.upsert(advisory("Lyon", "France", first_sync)).await.unwrap();
        assert!(!created.existed);

        let later = Utc::now();
        let updated = store.upsert(advisory("Lyon", "France", later)).await.unwrap();
        assert!(updated.existed);
        assert_eq!(updated.advisory.created_at, first_sync);
        assert_eq!(updated.advisory.synced_at, later);

        let stored = store.find_by_id("lyon").await.unwrap().unwrap();
        assert_eq!(stored.created_at, first_sync);
    }

    #[tokio::test]
    async fn test_save_overwrites_created_at() {
        let store = MemoryStore::new();
        let first_sync = Utc::now() - Duration::hours(3);
        store.save(advisory("Lyon", "France", first_sync)).await.unwrap();

        let later = Utc::now();
        store.save(advisory("Lyon", "France", later)).await.unwrap();

        let stored = store.find_by_id("lyon").await.unwrap().unwrap();
        assert_eq!(stored.created_at, later);
    }

    #[tokio::test]
    async fn test_filter_and_delete_by_keys() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.save(advisory("Lyon", "France", now)).await.unwrap();
        store.save(advisory("Nice", "France", now)).await.unwrap();
        store.save(advisory("Turin", "Italy", now)).await.unwrap();

        let french = store
            .find_all_filtered(&|a: &TravelAdvisory| a.country.matches_name("france"))
            .await
            .unwrap();
        assert_eq!(french.len(), 2);

        let removed = store
            .delete_by_keys(&["lyon".to_string(), "nice".to_string(), "paris".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.len().await, 1);
        assert!(store.exists_by_id("turin").await.unwrap());
        assert_eq!(store.list_cities().await.unwrap(), vec!["Turin"]);
    }
}

//! On-disk advisory store backed by fjall
//!
//! Records are postcard-encoded under their key in the `advisories` keyspace.
//! Listing iterates that keyspace, so a record and its visibility are one
//! write. fjall calls block, so every one runs on `spawn_blocking`.

use std::path::Path;

use async_trait::async_trait;
use fjall::Keyspace;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, info, instrument};

use super::{AdvisoryStore, SaveOutcome};
use crate::Result;
use crate::models::TravelAdvisory;

pub struct FjallStore {
    // held so the database stays open for the store's lifetime
    _database: fjall::Database,
    records: Keyspace,
    /// Serializes writes so an upsert's existence check and its write see the same state
    write_lock: Mutex<()>,
}

fn get_from_keyspace(keyspace: &Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>> {
    Ok(keyspace.get(key)?.map(|v| v.to_vec()))
}

fn read_record(records: &Keyspace, key: &str) -> Result<Option<TravelAdvisory>> {
    match get_from_keyspace(records, key.as_bytes())? {
        Some(bytes) => Ok(Some(postcard::from_bytes(&bytes)?)),
        None => Ok(None),
    }
}

/// Decode every stored record in key order, keeping what `keep` maps it to
fn scan_records<T>(records: &Keyspace, keep: impl Fn(TravelAdvisory) -> T) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for guard in records.iter() {
        let (_, bytes) = guard.into_inner()?;
        let advisory: TravelAdvisory = postcard::from_bytes(&bytes)?;
        items.push(keep(advisory));
    }
    Ok(items)
}

impl FjallStore {
    /// Open (or create) the store under `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        let database = fjall::Database::builder(path).open()?;
        let records = database.keyspace("advisories", fjall::KeyspaceCreateOptions::default)?;
        info!("Opened advisory store at {}", path.display());

        Ok(Self {
            _database: database,
            records,
            write_lock: Mutex::new(()),
        })
    }

    async fn write_record(&self, advisory: &TravelAdvisory) -> Result<()> {
        let records = self.records.clone();
        let key = advisory.key.clone().into_bytes();
        let bytes = postcard::to_stdvec(advisory)?;

        task::spawn_blocking(move || records.insert(key, bytes)).await??;
        Ok(())
    }

    async fn remove_keys(&self, keys: Vec<String>) -> Result<usize> {
        let records = self.records.clone();

        task::spawn_blocking(move || -> Result<usize> {
            let mut removed = 0;
            for key in keys {
                if records.contains_key(key.as_bytes())? {
                    removed += 1;
                }
                records.remove(key.into_bytes())?;
            }
            Ok(removed)
        })
        .await?
    }
}

#[async_trait]
impl AdvisoryStore for FjallStore {
    async fn exists_by_id(&self, key: &str) -> Result<bool> {
        let records = self.records.clone();
        let key = key.to_string();
        task::spawn_blocking(move || -> Result<bool> {
            Ok(records.contains_key(key.as_bytes())?)
        })
        .await?
    }

    #[instrument(name = "store_find", level = "debug", skip(self))]
    async fn find_by_id(&self, key: &str) -> Result<Option<TravelAdvisory>> {
        let records = self.records.clone();
        let key = key.to_string();
        task::spawn_blocking(move || read_record(&records, &key)).await?
    }

    #[instrument(name = "store_find_all", level = "debug", skip(self))]
    async fn find_all(&self) -> Result<Vec<TravelAdvisory>> {
        let records = self.records.clone();
        let advisories =
            task::spawn_blocking(move || scan_records(&records, |advisory| advisory)).await??;

        debug!("Loaded {} advisories", advisories.len());
        Ok(advisories)
    }

    #[instrument(name = "store_list_cities", level = "debug", skip(self))]
    async fn list_cities(&self) -> Result<Vec<String>> {
        let records = self.records.clone();
        let cities =
            task::spawn_blocking(move || scan_records(&records, |advisory| advisory.city)).await??;

        debug!("Listed {} stored cities", cities.len());
        Ok(cities)
    }

    #[instrument(
        name = "store_save",
        level = "debug",
        skip(self, advisory),
        fields(key = %advisory.key)
    )]
    async fn save(&self, advisory: TravelAdvisory) -> Result<TravelAdvisory> {
        let _guard = self.write_lock.lock().await;
        self.write_record(&advisory).await?;
        Ok(advisory)
    }

    #[instrument(
        name = "store_upsert",
        level = "debug",
        skip(self, advisory),
        fields(key = %advisory.key)
    )]
    async fn upsert(&self, mut advisory: TravelAdvisory) -> Result<SaveOutcome> {
        let _guard = self.write_lock.lock().await;

        let previous = self.find_by_id(&advisory.key).await?;
        if let Some(previous) = &previous {
            advisory.created_at = previous.created_at;
        }
        self.write_record(&advisory).await?;

        Ok(SaveOutcome {
            advisory,
            existed: previous.is_some(),
        })
    }

    async fn delete_by_id(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.remove_keys(vec![key.to_string()]).await?;
        Ok(())
    }

    async fn delete_by_keys(&self, keys: &[String]) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        self.remove_keys(keys.to_vec()).await
    }
}

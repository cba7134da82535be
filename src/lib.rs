//! Travel advisor - city weather and country facts kept fresh and turned into
//! travel advice
//!
//! This library provides the sync pipeline, the refresh orchestration around it,
//! the advisory rule engine and the HTTP API that exposes them.

pub mod advisory_engine;
pub mod api;
pub mod cities;
pub mod city_key;
pub mod config;
pub mod country;
pub mod error;
pub mod http;
pub mod models;
pub mod refresh;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod sync;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use city_key::CityKey;
pub use config::AdvisorConfig;
pub use error::AdvisoryError;
pub use models::{AuditType, CountrySnapshot, SyncedAdvisory, TravelAdvisory, WeatherSnapshot};
pub use refresh::{RefreshOrchestrator, RefreshSettings};
pub use service::{AdvisoryService, RefreshOutcome};
pub use store::{AdvisoryStore, FjallStore, MemoryStore};
pub use sync::{SyncPipeline, SyncSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AdvisoryError>;

//! Data models for the travel advisor
//!
//! This module contains the core domain models organized by concern:
//! - Weather: point-in-time weather snapshot for a city
//! - Country: country facts attached to every advisory
//! - Advisory: the persisted record and the audit classification of a sync

pub mod advisory;
pub mod country;
pub mod weather;

// Re-export all public types for convenient access
pub use advisory::{AuditType, SyncedAdvisory, TravelAdvisory};
pub use country::CountrySnapshot;
pub use weather::WeatherSnapshot;

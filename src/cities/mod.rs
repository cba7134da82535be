//! City discovery
//!
//! Ranked lists of the most populous cities in a country. Discovery is best
//! effort: implementations return an empty list instead of failing.

use async_trait::async_trait;

pub mod geonames;

pub use geonames::GeoNamesClient;

#[async_trait]
pub trait CityDiscovery: Send + Sync {
    /// Up to `limit` city names for an ISO country code, most populous first
    async fn top_cities(&self, country_code: &str, limit: usize) -> Vec<String>;
}

//! The persisted travel advisory and sync audit classification

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CountrySnapshot, WeatherSnapshot};

/// Weather and country facts for one city, stored under its normalized key
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TravelAdvisory {
    /// Normalized (trimmed, lower-cased) city name
    pub key: String,
    /// City name as it was requested
    pub city: String,
    pub weather: WeatherSnapshot,
    pub country: CountrySnapshot,
    /// Last successful sync
    pub synced_at: DateTime<Utc>,
    /// First successful sync
    pub created_at: DateTime<Utc>,
}

/// Whether a sync created the record or replaced an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditType {
    Created,
    Updated,
}

impl AuditType {
    #[must_use]
    pub fn from_existed(existed: bool) -> Self {
        if existed {
            AuditType::Updated
        } else {
            AuditType::Created
        }
    }
}

impl fmt::Display for AuditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditType::Created => f.pad("CREATED"),
            AuditType::Updated => f.pad("UPDATED"),
        }
    }
}

/// Outcome of syncing a single city
#[derive(Debug, Clone, PartialEq)]
pub struct SyncedAdvisory {
    pub advisory: TravelAdvisory,
    pub audit: AuditType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_type_from_existed() {
        assert_eq!(AuditType::from_existed(false), AuditType::Created);
        assert_eq!(AuditType::from_existed(true), AuditType::Updated);
    }

    #[test]
    fn test_audit_type_serialization() {
        assert_eq!(serde_json::to_string(&AuditType::Created).unwrap(), "\"CREATED\"");
        assert_eq!(serde_json::to_string(&AuditType::Updated).unwrap(), "\"UPDATED\"");
        assert_eq!(AuditType::Updated.to_string(), "UPDATED");
    }
}

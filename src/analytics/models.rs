//! Data models for analytics

use serde::{Deserialize, Serialize};

use crate::config::AnalyticsConfig;

/// Country derived from a client IP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// English country name
    pub name: String,

    /// ISO 3166-1 alpha-2 code (e.g., "US", "IN")
    pub iso_code: String,
}

impl Country {
    pub fn new(name: impl Into<String>, iso_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            iso_code: iso_code.into(),
        }
    }

    /// Country substituted when lookup fails
    pub fn default_from(config: &AnalyticsConfig) -> Self {
        Self::new(&config.default_country_name, &config.default_country_iso)
    }
}

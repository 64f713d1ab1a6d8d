//! Click records and the aggregate views derived from them

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A click ready to be appended. `anonymized_ip` is never the raw address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClick {
    pub link_code: String,
    pub browser: String,
    pub user_agent: String,
    pub referrer: String,
    pub country_name: String,
    pub country_iso_code: String,
    pub anonymized_ip: String,
    /// Unix timestamp (seconds, UTC)
    pub occurred_at: i64,
}

/// A stored click. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClickEvent {
    pub id: i64,
    pub link_code: String,
    pub browser: String,
    pub user_agent: String,
    pub referrer: String,
    pub country_name: String,
    pub country_iso_code: String,
    pub anonymized_ip: String,
    pub occurred_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DailyClicks {
    /// UTC calendar day, `YYYY-MM-DD`
    pub day: String,
    pub click_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BrowserClicks {
    pub browser: String,
    pub click_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ReferrerClicks {
    pub referrer: String,
    pub click_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CountryClicks {
    pub country_iso_code: String,
    pub country_name: String,
    pub click_count: i64,
}

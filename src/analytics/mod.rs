//! Click analytics
//!
//! Every recorded visit is reduced to an anonymized, geo-enriched record
//! before it reaches the store. The raw client IP only lives for the
//! duration of the request.

pub mod anonymize;
pub mod geoip;
pub mod ip_extractor;
pub mod models;
pub mod recorder;

pub use anonymize::{anonymize, Anonymizer};
pub use geoip::{open_resolver, resolve_country, GeoResolver, MaxMindResolver, NullResolver};
pub use ip_extractor::extract_client_ip;
pub use models::Country;
pub use recorder::{ClickRecorder, RawClick, Visit};

//! Country lookup using a MaxMind GeoLite2/GeoIP2 MMDB
//!
//! The reader is memory-mapped once at startup and shared by every lookup.
//! Lookups are local, so a miss or a decode failure is reported as `None`
//! and callers substitute a configured default country.

use anyhow::{Context, Result};
use maxminddb::{geoip2, Mmap, Reader};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::analytics::models::Country;

pub trait GeoResolver: Send + Sync {
    /// Country for `ip`, or `None` when the database has no usable record
    fn lookup(&self, ip: IpAddr) -> Option<Country>;
}

/// Resolver backed by a MaxMind Country or City database
pub struct MaxMindResolver {
    reader: Reader<Mmap>,
    path: String,
}

impl MaxMindResolver {
    pub fn open(path: &str) -> Result<Self> {
        let reader = unsafe { Reader::open_mmap(path) }
            .with_context(|| format!("Failed to open GeoIP database at {}", path))?;
        info!("GeoIP database opened: {}", path);
        Ok(Self {
            reader,
            path: path.to_string(),
        })
    }
}

impl GeoResolver for MaxMindResolver {
    fn lookup(&self, ip: IpAddr) -> Option<Country> {
        // geoip2::Country decodes from both Country and City databases
        let result = match self.reader.lookup(ip) {
            Ok(result) => result,
            Err(err) => {
                debug!(%ip, error = %err, "GeoIP lookup failed");
                return None;
            }
        };

        let record = match result.decode::<geoip2::Country>() {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(err) => {
                debug!(%ip, error = %err, "GeoIP record could not be decoded");
                return None;
            }
        };

        let iso_code = record.country.iso_code.filter(|code| !code.is_empty())?;
        Some(Country {
            name: record
                .country
                .names
                .english
                .map(|s| s.to_string())
                .unwrap_or_default(),
            iso_code: iso_code.to_string(),
        })
    }
}

impl Drop for MaxMindResolver {
    fn drop(&mut self) {
        info!("GeoIP database closed: {}", self.path);
    }
}

/// Resolver used when no database is configured; every lookup misses
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl GeoResolver for NullResolver {
    fn lookup(&self, _ip: IpAddr) -> Option<Country> {
        None
    }
}

/// Open the configured database, or fall back to [`NullResolver`]
pub fn open_resolver(path: Option<&str>) -> Result<Arc<dyn GeoResolver>> {
    match path {
        Some(path) => Ok(Arc::new(MaxMindResolver::open(path)?)),
        None => {
            info!("No GeoIP database configured; clicks will use the default country");
            Ok(Arc::new(NullResolver))
        }
    }
}

/// Resolve `ip` to a country, substituting `default` on any failure.
///
/// An unparseable address or a miss never surfaces as an error. A record
/// without an English name is reported under its ISO code.
pub fn resolve_country(resolver: &dyn GeoResolver, ip: &str, default: &Country) -> Country {
    let Ok(addr) = ip.trim().parse::<IpAddr>() else {
        debug!(ip, "unparseable client IP, using default country");
        return default.clone();
    };

    match resolver.lookup(addr) {
        Some(country) if country.name.is_empty() => Country {
            name: country.iso_code.clone(),
            iso_code: country.iso_code,
        },
        Some(country) => country,
        None => default.clone(),
    }
}

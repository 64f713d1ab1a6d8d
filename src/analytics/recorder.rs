//! Turns a visit into an anonymized, geo-enriched click record

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use std::net::IpAddr;
use std::sync::Arc;
use woothee::parser::Parser;

use crate::analytics::anonymize::Anonymizer;
use crate::analytics::geoip::{open_resolver, resolve_country, GeoResolver};
use crate::analytics::models::Country;
use crate::config::AnalyticsConfig;
use crate::models::NewClick;

/// Browser family recorded when the User-Agent is missing or unrecognised
pub const UNKNOWN_BROWSER: &str = "Other";

/// Referrer recorded when the request carries no Referer header
pub const DIRECT_REFERRER: &str = "direct";

/// Request metadata the recorder needs
#[derive(Debug, Clone)]
pub struct Visit {
    pub client_ip: IpAddr,
    pub user_agent: String,
    pub referrer: Option<String>,
    pub at: DateTime<Utc>,
}

impl Visit {
    pub fn from_headers(headers: &HeaderMap, client_ip: IpAddr, at: DateTime<Utc>) -> Self {
        let header_str = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        Self {
            client_ip,
            user_agent: header_str(header::USER_AGENT).unwrap_or_default(),
            referrer: header_str(header::REFERER),
            at,
        }
    }
}

/// Pre-hash click values, before geo lookup and anonymization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawClick<'a> {
    pub ip: &'a str,
    pub browser: &'a str,
    pub user_agent: &'a str,
    pub referrer: &'a str,
    pub at: DateTime<Utc>,
}

/// Builds click records for live traffic and for the seed run, so both
/// paths hash and geo-resolve identically
pub struct ClickRecorder {
    anonymizer: Anonymizer,
    geo: Arc<dyn GeoResolver>,
    default_country: Country,
}

impl ClickRecorder {
    pub fn new(anonymizer: Anonymizer, geo: Arc<dyn GeoResolver>, default_country: Country) -> Self {
        Self {
            anonymizer,
            geo,
            default_country,
        }
    }

    /// Salt, GeoIP database and fallback country taken from `config`
    pub fn from_config(config: &AnalyticsConfig) -> anyhow::Result<Self> {
        let geo = open_resolver(config.geoip_db_path.as_deref())?;
        Ok(Self::new(
            Anonymizer::new(config.hash_salt.clone()),
            geo,
            Country::default_from(config),
        ))
    }

    /// Click for a live visit; the browser family is parsed from the User-Agent
    pub fn build_click(&self, link_code: &str, visit: &Visit) -> NewClick {
        let ip = visit.client_ip.to_string();
        let browser = browser_family(&visit.user_agent);

        self.enrich(
            link_code,
            &RawClick {
                ip: &ip,
                browser: &browser,
                user_agent: &visit.user_agent,
                referrer: visit.referrer.as_deref().unwrap_or(DIRECT_REFERRER),
                at: visit.at,
            },
        )
    }

    /// Resolve the country and anonymize the IP of `raw`
    pub fn enrich(&self, link_code: &str, raw: &RawClick<'_>) -> NewClick {
        let country = resolve_country(self.geo.as_ref(), raw.ip, &self.default_country);

        NewClick {
            link_code: link_code.to_string(),
            browser: raw.browser.to_string(),
            user_agent: raw.user_agent.to_string(),
            referrer: raw.referrer.to_string(),
            country_name: country.name,
            country_iso_code: country.iso_code,
            anonymized_ip: self.anonymizer.anonymize(raw.ip, &raw.at),
            occurred_at: raw.at.timestamp(),
        }
    }
}

fn browser_family(user_agent: &str) -> String {
    match Parser::new().parse(user_agent) {
        Some(result) if !result.name.is_empty() && result.name != "UNKNOWN" => {
            result.name.to_string()
        }
        _ => UNKNOWN_BROWSER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::geoip::NullResolver;
    use axum::http::HeaderValue;

    const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    fn recorder(salt: &str) -> ClickRecorder {
        ClickRecorder::new(
            Anonymizer::new(salt),
            Arc::new(NullResolver),
            Country::new("India", "IN"),
        )
    }

    fn visit(user_agent: &str, referrer: Option<&str>) -> Visit {
        Visit {
            client_ip: "203.0.113.9".parse().unwrap(),
            user_agent: user_agent.to_string(),
            referrer: referrer.map(str::to_string),
            at: DateTime::parse_from_rfc3339("2025-01-02T03:04:05Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_build_click_enriches_visit() {
        let v = visit(CHROME_UA, Some("https://news.ycombinator.com/"));
        let click = recorder("pepper").build_click("abc123", &v);

        assert_eq!(click.link_code, "abc123");
        assert_eq!(click.browser, "Chrome");
        assert_eq!(click.user_agent, CHROME_UA);
        assert_eq!(click.referrer, "https://news.ycombinator.com/");
        assert_eq!(click.country_name, "India");
        assert_eq!(click.country_iso_code, "IN");
        assert_eq!(click.occurred_at, v.at.timestamp());
        assert_eq!(
            click.anonymized_ip,
            crate::analytics::anonymize("203.0.113.9", "pepper", &v.at)
        );
        assert!(!click.anonymized_ip.contains("203.0.113.9"));
    }

    #[test]
    fn test_missing_metadata_defaults() {
        let click = recorder("pepper").build_click("abc123", &visit("", None));
        assert_eq!(click.browser, UNKNOWN_BROWSER);
        assert_eq!(click.referrer, DIRECT_REFERRER);
    }

    #[test]
    fn test_empty_salt_stores_sentinel() {
        let click = recorder("").build_click("abc123", &visit(CHROME_UA, None));
        assert_eq!(click.anonymized_ip, "");
    }

    #[test]
    fn test_enrich_keeps_given_categories() {
        let at = Utc::now();
        let raw = RawClick {
            ip: "not-an-ip",
            browser: "Opera",
            user_agent: "Mozilla/5.0 (X11; Linux x86_64)",
            referrer: "https://bing.com",
            at,
        };
        let click = recorder("pepper").enrich("demo-code", &raw);

        assert_eq!(click.browser, "Opera");
        assert_eq!(click.referrer, "https://bing.com");
        assert_eq!(click.country_iso_code, "IN");
        assert_eq!(click.anonymized_ip, crate::analytics::anonymize("not-an-ip", "pepper", &at));
    }

    #[test]
    fn test_visit_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(CHROME_UA));
        headers.insert(header::REFERER, HeaderValue::from_static("  "));
        let at = Utc::now();

        let v = Visit::from_headers(&headers, "198.51.100.4".parse().unwrap(), at);
        assert_eq!(v.user_agent, CHROME_UA);
        assert_eq!(v.referrer, None);
        assert_eq!(v.at, at);
    }
}

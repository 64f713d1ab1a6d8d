//! Destination URL policy
//!
//! A destination is accepted only if it is an absolute http(s) URL on its
//! default port whose host is a DNS name, not an IP literal and not a
//! loopback or mDNS name.

use thiserror::Error;
use url::{Host, Url};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlRejection {
    #[error("not a valid absolute URL")]
    Malformed,
    #[error("scheme '{0}' is not allowed, use http or https")]
    Scheme(String),
    #[error("port {0} is not the default port for the scheme")]
    Port(u16),
    #[error("URL has no host")]
    MissingHost,
    #[error("IP address hosts are not allowed")]
    IpHost,
    #[error("local hosts are not allowed")]
    LocalHost,
}

/// Check `raw` against the destination policy and return the parsed URL
pub fn validate(raw: &str) -> Result<Url, UrlRejection> {
    let url = Url::parse(raw.trim()).map_err(|_| UrlRejection::Malformed)?;

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(UrlRejection::Scheme(scheme.to_string()));
    }

    // `Url::port` is None when the port is absent or equal to the scheme default,
    // so any value here is a non-default port.
    if let Some(port) = url.port() {
        return Err(UrlRejection::Port(port));
    }

    match url.host() {
        None => return Err(UrlRejection::MissingHost),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => return Err(UrlRejection::IpHost),
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            if domain.is_empty() {
                return Err(UrlRejection::MissingHost);
            }
            if domain == "localhost" || domain.ends_with(".local") {
                return Err(UrlRejection::LocalHost);
            }
        }
    }

    Ok(url)
}

/// Total predicate form of [`validate`]
pub fn is_valid(raw: &str) -> bool {
    validate(raw).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(is_valid("https://example.com"));
        assert!(is_valid("http://example.com/path?q=1#frag"));
        assert!(is_valid("https://sub.example.co.uk/a/b"));
        assert!(is_valid("HTTPS://EXAMPLE.COM"));
    }

    #[test]
    fn test_default_ports_are_allowed() {
        assert!(is_valid("http://example.com:80/"));
        assert!(is_valid("https://example.com:443/"));
    }

    #[test]
    fn test_non_default_ports_are_rejected() {
        assert_eq!(
            validate("https://example.com:8443"),
            Err(UrlRejection::Port(8443))
        );
        assert_eq!(validate("http://example.com:443"), Err(UrlRejection::Port(443)));
        assert_eq!(validate("https://example.com:80"), Err(UrlRejection::Port(80)));
        assert!(!is_valid("http://example.com:8080"));
    }

    #[test]
    fn test_schemes() {
        assert_eq!(
            validate("ftp://example.com"),
            Err(UrlRejection::Scheme("ftp".to_string()))
        );
        assert!(!is_valid("javascript:alert(1)"));
        assert!(!is_valid("file:///etc/passwd"));
        assert!(!is_valid("mailto:someone@example.com"));
    }

    #[test]
    fn test_ip_hosts_are_rejected() {
        assert_eq!(validate("https://1.2.3.4"), Err(UrlRejection::IpHost));
        assert_eq!(validate("http://[::1]/"), Err(UrlRejection::IpHost));
        assert_eq!(validate("http://127.0.0.1/admin"), Err(UrlRejection::IpHost));
    }

    #[test]
    fn test_local_hosts_are_rejected() {
        assert_eq!(validate("http://localhost"), Err(UrlRejection::LocalHost));
        assert_eq!(validate("http://LOCALHOST/x"), Err(UrlRejection::LocalHost));
        assert_eq!(validate("http://localhost./"), Err(UrlRejection::LocalHost));
        assert_eq!(validate("https://printer.local"), Err(UrlRejection::LocalHost));
        assert!(is_valid("https://localhost.example.com"));
        assert!(is_valid("https://notlocal.com"));
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        assert_eq!(validate("not a url"), Err(UrlRejection::Malformed));
        assert!(!is_valid(""));
        assert!(!is_valid("   "));
        assert!(!is_valid("http://"));
        assert!(!is_valid("example.com"));
        assert!(!is_valid("https://exa mple.com"));
    }
}

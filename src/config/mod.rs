use anyhow::Context;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL prepended to short codes in shorten responses
    pub public_base_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustedProxyMode {
    /// Use the socket peer address only
    None,
    /// X-Forwarded-For / X-Real-IP
    Standard,
    /// CF-Connecting-IP
    Cloudflare,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Process-wide salt for IP anonymization. Changing it breaks comparability
    /// of previously stored hashes.
    pub hash_salt: String,
    pub geoip_db_path: Option<String>,
    pub default_country_name: String,
    pub default_country_iso: String,
    pub trusted_proxy_mode: TrustedProxyMode,
    #[serde(default)]
    pub trusted_proxies: Vec<IpNet>,
}

impl AnalyticsConfig {
    pub const DEFAULT_COUNTRY_NAME: &'static str = "India";
    pub const DEFAULT_COUNTRY_ISO: &'static str = "IN";
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            hash_salt: String::new(),
            geoip_db_path: None,
            default_country_name: Self::DEFAULT_COUNTRY_NAME.to_string(),
            default_country_iso: Self::DEFAULT_COUNTRY_ISO.to_string(),
            trusted_proxy_mode: TrustedProxyMode::Standard,
            trusted_proxies: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            _ => DatabaseBackend::Sqlite,
        };

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./tinyrl.db?mode=rwc".to_string());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let hash_salt = std::env::var("HASH_SALT").unwrap_or_default();
        if hash_salt.is_empty() {
            tracing::warn!(
                "HASH_SALT is not set; anonymized IPs will be stored as empty strings"
            );
        }

        let geoip_db_path = std::env::var("GEOIP_DB_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty());

        let default_country_name = std::env::var("DEFAULT_COUNTRY_NAME")
            .unwrap_or_else(|_| AnalyticsConfig::DEFAULT_COUNTRY_NAME.to_string());
        let default_country_iso = std::env::var("DEFAULT_COUNTRY_ISO")
            .unwrap_or_else(|_| AnalyticsConfig::DEFAULT_COUNTRY_ISO.to_string());

        let trusted_proxy_mode = match std::env::var("TRUSTED_PROXY_MODE")
            .unwrap_or_else(|_| "standard".to_string())
            .to_lowercase()
            .as_str()
        {
            "none" => TrustedProxyMode::None,
            "standard" => TrustedProxyMode::Standard,
            "cloudflare" => TrustedProxyMode::Cloudflare,
            other => {
                tracing::warn!(
                    "Unknown TRUSTED_PROXY_MODE '{other}', falling back to 'standard'. Supported values: none, standard, cloudflare"
                );
                TrustedProxyMode::Standard
            }
        };

        let trusted_proxies = match std::env::var("TRUSTED_PROXIES") {
            Ok(raw) => parse_trusted_proxies(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            server: ServerConfig {
                host,
                port,
                public_base_url,
            },
            analytics: AnalyticsConfig {
                hash_salt,
                geoip_db_path,
                default_country_name,
                default_country_iso,
                trusted_proxy_mode,
                trusted_proxies,
            },
        })
    }
}

/// Parse a comma-separated list of CIDRs or bare addresses.
fn parse_trusted_proxies(raw: &str) -> anyhow::Result<Vec<IpNet>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<IpNet>()
                .or_else(|_| s.parse::<std::net::IpAddr>().map(IpNet::from))
                .with_context(|| format!("invalid entry in TRUSTED_PROXIES: {s}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trusted_proxies_mixed() {
        let nets = parse_trusted_proxies("10.0.0.0/8, 192.168.1.7 ,,2001:db8::/32").unwrap();
        assert_eq!(nets.len(), 3);
        assert!(nets[1].contains(&"192.168.1.7".parse::<std::net::IpAddr>().unwrap()));
        assert_eq!(nets[1].prefix_len(), 32);
    }

    #[test]
    fn test_parse_trusted_proxies_rejects_garbage() {
        assert!(parse_trusted_proxies("10.0.0.0/8,not-an-ip").is_err());
    }
}

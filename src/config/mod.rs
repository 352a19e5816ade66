use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub retry: RetryConfig,
    pub lookup: LookupConfig,
    pub maps: MapsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the geolocation service; lookups go to `{base_url}/json/{address}`
    pub base_url: String,
    /// Optional `fields=` selector forwarded to the provider
    #[serde(default)]
    pub fields: Option<String>,
    #[serde(default = "ProviderConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt, shared by connect and read failures
    pub total: u32,
    /// Seconds; the n-th retry waits `backoff_factor * 2^(n-1)`
    pub backoff_factor: f64,
    pub status_forcelist: Vec<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Upper bound on concurrently running resolutions
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsConfig {
    pub base_url: String,
}

impl ProviderConfig {
    const fn default_timeout_secs() -> u64 {
        10
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://ip-api.com".to_string(),
            fields: None,
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            total: 3,
            backoff_factor: 0.3,
            status_forcelist: vec![500, 502, 504],
        }
    }
}

impl LookupConfig {
    pub fn default_workers() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            workers: Self::default_workers(),
        }
    }
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.google.com".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("SERVER_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid port number")?;

        let provider_defaults = ProviderConfig::default();
        let base_url = std::env::var("GEOIP_API_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(provider_defaults.base_url);
        let fields = std::env::var("GEOIP_FIELDS")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let timeout_secs = match std::env::var("GEOIP_TIMEOUT_SECS") {
            Ok(v) => v
                .parse::<u64>()
                .context("GEOIP_TIMEOUT_SECS must be a whole number of seconds")?,
            Err(_) => provider_defaults.timeout_secs,
        };

        let retry_defaults = RetryConfig::default();
        let total = match std::env::var("RETRY_TOTAL") {
            Ok(v) => v
                .parse::<u32>()
                .context("RETRY_TOTAL must be a non-negative integer")?,
            Err(_) => retry_defaults.total,
        };
        let backoff_factor = match std::env::var("RETRY_BACKOFF_FACTOR") {
            Ok(v) => {
                let factor = v
                    .parse::<f64>()
                    .context("RETRY_BACKOFF_FACTOR must be a number")?;
                if !factor.is_finite() || factor < 0.0 {
                    anyhow::bail!("RETRY_BACKOFF_FACTOR must be a non-negative number, got {v}");
                }
                factor
            }
            Err(_) => retry_defaults.backoff_factor,
        };
        let status_forcelist = match std::env::var("RETRY_STATUS_CODES") {
            Ok(v) => parse_status_list(&v)?,
            Err(_) => retry_defaults.status_forcelist,
        };

        let workers = match std::env::var("LOOKUP_WORKERS") {
            Ok(v) => parse_workers(&v)?,
            Err(_) => LookupConfig::default_workers(),
        };

        let maps_base_url = std::env::var("MAPS_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| MapsConfig::default().base_url);

        Ok(Config {
            server: ServerConfig { host, port },
            provider: ProviderConfig {
                base_url,
                fields,
                timeout_secs,
            },
            retry: RetryConfig {
                total,
                backoff_factor,
                status_forcelist,
            },
            lookup: LookupConfig { workers },
            maps: MapsConfig {
                base_url: maps_base_url,
            },
        })
    }
}

/// Largest accepted `LOOKUP_WORKERS`
pub const MAX_LOOKUP_WORKERS: usize = 4096;

/// Parse `LOOKUP_WORKERS`; 0 is raised to 1, values above [`MAX_LOOKUP_WORKERS`] are rejected
pub fn parse_workers(raw: &str) -> anyhow::Result<usize> {
    let workers = raw
        .trim()
        .parse::<usize>()
        .context("LOOKUP_WORKERS must be a positive integer")?;
    if workers > MAX_LOOKUP_WORKERS {
        anyhow::bail!("LOOKUP_WORKERS must be at most {MAX_LOOKUP_WORKERS}, got {workers}");
    }
    Ok(workers.max(1))
}

/// Parse a comma separated list of HTTP status codes such as `500,502,504`
pub fn parse_status_list(raw: &str) -> anyhow::Result<Vec<u16>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let code = s
                .parse::<u16>()
                .with_context(|| format!("invalid status code '{s}' in RETRY_STATUS_CODES"))?;
            if !(100..=599).contains(&code) {
                anyhow::bail!("status code {code} in RETRY_STATUS_CODES is out of range");
            }
            Ok(code)
        })
        .collect()
}

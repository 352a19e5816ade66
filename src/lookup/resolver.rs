//! Single-address resolution against an ip-api compatible service

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::{trace, warn};

use crate::client::HttpClient;
use crate::config::ProviderConfig;
use crate::lookup::models::LocationRecord;

/// Maps one address to a location, or to nothing.
///
/// Implementations never fail outright: every failure is logged and
/// reported as `None` so one bad address cannot sink a batch.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, address: &str) -> Option<LocationRecord>;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}

/// Resolver backed by the ip-api JSON endpoint (`GET {base}/json/{address}`)
#[derive(Clone)]
pub struct IpApiResolver {
    client: HttpClient,
    base_url: Url,
    fields: Option<String>,
}

impl IpApiResolver {
    pub fn new(client: HttpClient, config: &ProviderConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid geolocation provider URL {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("geolocation provider URL {} cannot carry a path", config.base_url);
        }

        Ok(Self {
            client,
            base_url,
            fields: config.fields.clone(),
        })
    }

    /// The address becomes a single percent-encoded path segment, so `/`,
    /// `?` and `#` inside a token cannot escape into the query or fragment.
    /// It is otherwise unvalidated; the provider rejects anything that is
    /// not an IP or hostname.
    pub fn lookup_url(&self, address: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("json").push(address);
        }
        let query = self.fields.as_deref().map(|fields| format!("fields={fields}"));
        url.set_query(query.as_deref());
        url
    }
}

#[async_trait]
impl Resolver for IpApiResolver {
    async fn resolve(&self, address: &str) -> Option<LocationRecord> {
        let url = self.lookup_url(address);

        let response = match self.client.fetch(url.as_str()).await {
            Ok(response) => response,
            Err(err) => {
                warn!(address, error = %err, "network error during geolocation lookup");
                return None;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            warn!(address, status = status.as_u16(), "geolocation provider returned HTTP error");
            return None;
        }

        let payload: Value = match response.json().await {
            Ok(payload) => payload,
            Err(err) => {
                warn!(address, error = %err, "geolocation response could not be decoded");
                return None;
            }
        };

        if payload.get("status").and_then(Value::as_str) != Some("success") {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("No message");
            warn!(address, provider_message = message, "geolocation provider reported failure");
            return None;
        }

        trace!(address, "geolocation lookup succeeded");
        Some(LocationRecord::from_payload(address, &payload))
    }

    fn name(&self) -> &'static str {
        "ip-api"
    }
}

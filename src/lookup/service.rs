//! End-to-end lookup pipeline shared by the web and command-line fronts

use serde::Serialize;
use std::sync::Arc;

use crate::client::{HttpClient, RetryPolicy};
use crate::config::Config;
use crate::lookup::bulk::{split_addresses, BulkLookup};
use crate::lookup::models::{FrequencyEntry, LocationRecord};
use crate::lookup::resolver::{IpApiResolver, Resolver};
use crate::lookup::route::RouteBuilder;

/// Everything a front end renders for one submitted batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct LookupReport {
    pub results: Vec<LocationRecord>,
    pub top5: Vec<FrequencyEntry>,
    pub route_url: Option<String>,
}

#[derive(Clone)]
pub struct LookupService {
    engine: BulkLookup,
    routes: RouteBuilder,
}

impl LookupService {
    pub fn new(engine: BulkLookup, routes: RouteBuilder) -> Self {
        Self { engine, routes }
    }

    /// Wire up the ip-api resolver, retrying client and route builder from config
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = HttpClient::new(
            config.provider.timeout(),
            RetryPolicy::from(&config.retry),
        )?;
        let resolver: Arc<dyn Resolver> = Arc::new(IpApiResolver::new(client, &config.provider)?);

        Ok(Self::new(
            BulkLookup::new(resolver, config.lookup.workers),
            RouteBuilder::from(&config.maps),
        ))
    }

    /// Tokenize free text and run the pipeline
    pub async fn lookup_text(&self, input: &str) -> LookupReport {
        self.lookup(&split_addresses(input)).await
    }

    pub async fn lookup<S: AsRef<str>>(&self, addresses: &[S]) -> LookupReport {
        let outcome = self.engine.run(addresses).await;
        let route_url = if outcome.results.is_empty() {
            None
        } else {
            self.routes.build(&outcome.results)
        };

        LookupReport {
            results: outcome.results,
            top5: outcome.top5,
            route_url,
        }
    }

    pub fn routes(&self) -> &RouteBuilder {
        &self.routes
    }
}

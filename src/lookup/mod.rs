//! IP geolocation lookup pipeline
//!
//! Raw input is split into address tokens, deduplicated and resolved
//! concurrently against the geolocation provider, then ranked by
//! frequency and turned into a directions link.

pub mod bulk;
pub mod models;
pub mod resolver;
pub mod route;
pub mod service;

pub use bulk::{split_addresses, BulkLookup, BulkOutcome, FrequencyTable, TOP_N};
pub use models::{FrequencyEntry, LocationRecord, UNKNOWN};
pub use resolver::{IpApiResolver, Resolver};
pub use route::{build_route_url, RouteBuilder};
pub use service::{LookupReport, LookupService};

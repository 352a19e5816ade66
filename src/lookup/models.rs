//! Data models for geolocation lookups

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder for attributes the provider did not return
pub const UNKNOWN: &str = "N/A";

/// Resolved geolocation data for one address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// The address token exactly as submitted
    pub address: String,

    pub country_name: String,

    /// ISO country code (e.g., "US", "GB")
    pub country_code: String,

    pub city: String,

    /// Short region code (e.g., "CA")
    pub region: String,

    pub region_name: String,

    pub district: String,

    pub zip: String,

    pub latitude: Option<f64>,

    pub longitude: Option<f64>,

    /// IANA timezone name
    pub timezone: String,

    /// UTC offset in seconds
    pub offset: Option<i64>,

    pub currency: String,

    pub continent: String,

    pub continent_code: String,

    pub isp: String,

    pub org: String,

    /// Autonomous system identifier (e.g., "AS15169 Google LLC")
    #[serde(rename = "as")]
    pub as_number: String,

    #[serde(rename = "asname")]
    pub as_name: String,

    pub mobile: bool,

    pub proxy: bool,

    pub hosting: bool,
}

impl LocationRecord {
    /// Build a record from an untyped provider payload.
    ///
    /// Missing or mistyped attributes fall back to [`UNKNOWN`], `None` or
    /// `false` rather than rejecting the whole payload.
    pub fn from_payload(address: &str, payload: &Value) -> Self {
        Self {
            address: address.to_string(),
            country_name: text(payload, "country"),
            country_code: text(payload, "countryCode"),
            city: text(payload, "city"),
            region: text(payload, "region"),
            region_name: text(payload, "regionName"),
            district: text(payload, "district"),
            zip: text(payload, "zip"),
            latitude: payload.get("lat").and_then(Value::as_f64),
            longitude: payload.get("lon").and_then(Value::as_f64),
            timezone: text(payload, "timezone"),
            offset: payload.get("offset").and_then(Value::as_i64),
            currency: text(payload, "currency"),
            continent: text(payload, "continent"),
            continent_code: text(payload, "continentCode"),
            isp: text(payload, "isp"),
            org: text(payload, "org"),
            as_number: text(payload, "as"),
            as_name: text(payload, "asname"),
            mobile: flag(payload, "mobile"),
            proxy: flag(payload, "proxy"),
            hosting: flag(payload, "hosting"),
        }
    }

    /// `(latitude, longitude)` when the provider returned both
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

fn text(payload: &Value, key: &str) -> String {
    match payload.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

fn flag(payload: &Value, key: &str) -> bool {
    payload.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// How often one address appeared in the submitted batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub address: String,
    pub count: usize,
}

impl FrequencyEntry {
    pub fn new(address: impl Into<String>, count: usize) -> Self {
        Self {
            address: address.into(),
            count,
        }
    }
}

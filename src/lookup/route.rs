//! Directions link through an ordered sequence of resolved locations

use crate::config::MapsConfig;
use crate::lookup::models::LocationRecord;

/// Builds directions URLs of the form
/// `{base}/maps/dir/?api=1&origin=lat,lon&destination=lat,lon[&waypoints=lat,lon|...]`
#[derive(Debug, Clone)]
pub struct RouteBuilder {
    base_url: String,
}

impl RouteBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// First location is the origin, last the destination, everything in
    /// between becomes a waypoint in the given order.
    ///
    /// Locations without coordinates are skipped. Returns `None` when fewer
    /// than two locations remain.
    pub fn build(&self, locations: &[LocationRecord]) -> Option<String> {
        let points: Vec<String> = locations
            .iter()
            .filter_map(LocationRecord::coordinates)
            .map(|(lat, lon)| format!("{lat},{lon}"))
            .collect();

        let (origin, rest) = points.split_first()?;
        let (destination, waypoints) = rest.split_last()?;

        let mut url = format!(
            "{}/maps/dir/?api=1&origin={}&destination={}",
            self.base_url, origin, destination
        );
        if !waypoints.is_empty() {
            url.push_str("&waypoints=");
            url.push_str(&waypoints.join("|"));
        }
        Some(url)
    }
}

impl Default for RouteBuilder {
    fn default() -> Self {
        Self::new(&MapsConfig::default().base_url)
    }
}

impl From<&MapsConfig> for RouteBuilder {
    fn from(config: &MapsConfig) -> Self {
        Self::new(&config.base_url)
    }
}

/// Convenience wrapper over [`RouteBuilder::build`] using the default maps host
pub fn build_route_url(locations: &[LocationRecord]) -> Option<String> {
    RouteBuilder::default().build(locations)
}

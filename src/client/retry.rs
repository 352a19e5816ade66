//! Retry policy with exponential backoff.

use reqwest::StatusCode;
use std::time::Duration;

use crate::config::RetryConfig;

/// Longest single sleep between two attempts, whatever the factor
pub const BACKOFF_MAX: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub total: u32,
    /// Seconds
    pub backoff_factor: f64,
    pub status_forcelist: Vec<u16>,
}

impl RetryPolicy {
    /// A policy that gives up on the first failure
    pub fn none() -> Self {
        Self {
            total: 0,
            backoff_factor: 0.0,
            status_forcelist: Vec::new(),
        }
    }

    /// Delay before the given retry (1-based): `backoff_factor * 2^(retry - 1)`.
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 || self.backoff_factor <= 0.0 {
            return Duration::ZERO;
        }

        let exponent = (retry - 1).min(i32::MAX as u32) as i32;
        let secs = self.backoff_factor * 2f64.powi(exponent);
        if !secs.is_finite() || secs >= BACKOFF_MAX.as_secs_f64() {
            return BACKOFF_MAX;
        }
        Duration::from_secs_f64(secs)
    }

    pub fn retries_status(&self, status: StatusCode) -> bool {
        self.status_forcelist.contains(&status.as_u16())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryConfig::default().into()
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self {
            total: config.total,
            backoff_factor: config.backoff_factor,
            status_forcelist: config.status_forcelist,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        config.clone().into()
    }
}

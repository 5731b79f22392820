//! Engine configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::limiter::DEFAULT_CEILING;
use crate::retry::RetryPolicy;

/// What to do with a service whose liveness check fails before a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreflightPolicy {
    /// Skip the check; individual calls fail on their own
    #[default]
    Proceed,
    /// Refuse to start the batch
    Abort,
    /// Do not call the unhealthy service for any ticker
    SkipService,
}

/// Static settings for one batch run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Service calls allowed in flight at once across the batch
    pub max_concurrency: usize,
    /// Retry policy applied to every service call
    pub retry: RetryPolicy,
    /// Deadline for the whole batch; `None` waits for every ticker
    pub batch_timeout: Option<Duration>,
    /// History window requested from the market-data service
    pub lookback_days: u32,
    /// Analysis date passed to technical analysis
    pub as_of: Option<NaiveDate>,
    pub preflight: PreflightPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_CEILING,
            retry: RetryPolicy::default(),
            batch_timeout: None,
            lookback_days: 90,
            as_of: None,
            preflight: PreflightPolicy::Proceed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.retry.max_retries(), 2);
        assert!(config.batch_timeout.is_none());
        assert_eq!(config.preflight, PreflightPolicy::Proceed);
    }
}

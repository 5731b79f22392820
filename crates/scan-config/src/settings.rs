//! Configuration structures.

use chrono::NaiveDate;
use scan_engine::{EngineConfig, PreflightPolicy, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub services: ServiceSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "market-scan".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    /// Directory for daily-rotated log files
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            directory: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Backend service endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub market_data_url: String,
    pub technical_url: String,
    pub options_url: String,
    /// Per-call timeout in milliseconds
    pub call_timeout_ms: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            market_data_url: "http://localhost:5000".to_string(),
            technical_url: "http://localhost:5001".to_string(),
            options_url: "http://localhost:5002".to_string(),
            call_timeout_ms: 30_000,
        }
    }
}

impl ServiceSettings {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// Orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub max_concurrency: usize,
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub batch_timeout_secs: Option<u64>,
    pub lookback_days: u32,
    pub as_of: Option<NaiveDate>,
    pub preflight: PreflightPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            max_retries: 2,
            backoff_ms: 500,
            batch_timeout_secs: None,
            lookback_days: 90,
            as_of: None,
            preflight: PreflightPolicy::Proceed,
        }
    }
}

impl EngineSettings {
    /// Convert to the engine's runtime configuration.
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_concurrency: self.max_concurrency,
            retry: RetryPolicy::new(self.max_retries, Duration::from_millis(self.backoff_ms)),
            batch_timeout: self.batch_timeout_secs.map(Duration::from_secs),
            lookback_days: self.lookback_days,
            as_of: self.as_of,
            preflight: self.preflight,
        }
    }
}

/// Batch output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// File for the batch JSON; stdout when unset
    pub path: Option<String>,
    pub pretty: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: None,
            pretty: true,
        }
    }
}

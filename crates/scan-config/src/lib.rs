//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, EngineSettings, LoggingConfig, OutputSettings, ServiceSettings,
};

use config::{Config, Environment, File};
use scan_core::types::ServiceKind;
use std::path::Path;
use thiserror::Error;

/// Prefix for environment overrides, e.g. `SCAN__ENGINE__MAX_CONCURRENCY`.
pub const ENV_PREFIX: &str = "SCAN";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Load configuration from file and environment.
///
/// Without a file, defaults are used and only environment overrides apply.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, SettingsError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

impl AppConfig {
    /// Reject settings no run could work with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.engine.max_concurrency == 0 {
            return Err(SettingsError::Invalid(
                "engine.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.services.call_timeout_ms == 0 {
            return Err(SettingsError::Invalid(
                "services.call_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.engine.batch_timeout_secs == Some(0) {
            return Err(SettingsError::Invalid(
                "engine.batch_timeout_secs must be greater than 0 when set".to_string(),
            ));
        }
        for kind in ServiceKind::ALL {
            if self.endpoint(kind).trim().is_empty() {
                return Err(SettingsError::Invalid(format!("no endpoint configured for {}", kind)));
            }
        }
        Ok(())
    }

    /// Base URL of a backend service.
    pub fn endpoint(&self, kind: ServiceKind) -> &str {
        match kind {
            ServiceKind::MarketData => &self.services.market_data_url,
            ServiceKind::Technical => &self.services.technical_url,
            ServiceKind::Options => &self.services.options_url,
        }
    }

    /// The effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scan_engine::PreflightPolicy;
    use std::io::Write;
    use std::time::Duration;

    fn config_file(contents: &str) -> tempfile::TempPath {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.into_temp_path()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint(ServiceKind::Options), "http://localhost:5002");

        let engine = config.engine.to_engine_config();
        assert_eq!(engine.max_concurrency, 8);
        assert_eq!(engine.retry.max_attempts(), 3);
        assert_eq!(engine.retry.delay_for(1), Duration::from_millis(500));
    }

    #[test]
    fn test_load_partial_file() {
        let path = config_file(
            r#"
[services]
technical_url = "http://ta.internal:8001"

[engine]
max_concurrency = 4
batch_timeout_secs = 120
preflight = "skip-service"
"#,
        );

        let config = load_config(Some(&*path)).unwrap();
        assert_eq!(config.services.technical_url, "http://ta.internal:8001");
        assert_eq!(config.services.market_data_url, "http://localhost:5000");
        assert_eq!(config.engine.max_concurrency, 4);
        assert_eq!(config.engine.preflight, PreflightPolicy::SkipService);
        assert_eq!(
            config.engine.to_engine_config().batch_timeout,
            Some(Duration::from_secs(120))
        );
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let path = config_file("[engine]\nmax_concurrency = 0\n");
        let err = load_config(Some(&*path)).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let mut config = AppConfig::default();
        config.services.market_data_url = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("market-data"));
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = AppConfig::default();
        config.services.call_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.engine.batch_timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = load_config(Some(Path::new("/nonexistent/scan.toml"))).unwrap_err();
        assert!(matches!(err, SettingsError::Load(_)));
    }

    #[test]
    fn test_environment_override() {
        std::env::set_var("SCAN__SERVICES__OPTIONS_URL", "http://options.test:9000");
        let config = load_config(None).unwrap();
        std::env::remove_var("SCAN__SERVICES__OPTIONS_URL");
        assert_eq!(config.services.options_url, "http://options.test:9000");
    }

    #[test]
    fn test_renders_toml() {
        let rendered = AppConfig::default().to_toml().unwrap();
        assert!(rendered.contains("[engine]"));
        assert!(rendered.contains("preflight = \"proceed\""));
    }
}
